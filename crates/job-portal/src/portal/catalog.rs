use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::domain::{Job, JobId, SkillSet};
use super::identity::UserId;
use super::memory::{InMemoryJobStore, InMemoryProfileStore};

/// Jobs and applicant skill profiles used to seed the in-memory stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub profiles: Vec<ProfileEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub user_id: UserId,
    #[serde(default)]
    pub skills: SkillSet,
}

impl Catalog {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_reader(reader)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let file = File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Small catalog for demos: two recruiters with one job each and two
    /// job seekers.
    pub fn demo() -> Self {
        let job = |id: &str, owner: &str, title: &str, skills: &str| Job {
            id: JobId::from(id),
            owner_id: UserId::from(owner),
            title: title.to_string(),
            company: Some("Northwind Talent".to_string()),
            required_skills: SkillSet::parse(skills),
        };
        let profile = |user: &str, skills: &str| ProfileEntry {
            user_id: UserId::from(user),
            skills: SkillSet::parse(skills),
        };

        Self {
            jobs: vec![
                job("job-1", "recruiter-1", "Backend Engineer", "Go, SQL"),
                job("job-2", "recruiter-2", "Data Analyst", "Python, SQL, Tableau"),
            ],
            profiles: vec![
                profile("seeker-1", "Go, Python"),
                profile("seeker-2", "SQL, Python, Excel"),
            ],
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for job in &self.jobs {
            if !seen.insert(&job.id) {
                return Err(CatalogError::DuplicateJob(job.id.clone()));
            }
        }
        Ok(())
    }

    pub fn into_stores(self) -> (InMemoryJobStore, InMemoryProfileStore) {
        let jobs = InMemoryJobStore::with_jobs(self.jobs);
        let profiles = InMemoryProfileStore::with_profiles(
            self.profiles
                .into_iter()
                .map(|entry| (entry.user_id, entry.skills)),
        );
        (jobs, profiles)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog lists job {0} more than once")]
    DuplicateJob(JobId),
}
