use super::domain::{Job, SkillSet};

/// Share of the job's required skills the applicant declares, as an integer
/// percentage rounded to nearest (halves round up).
///
/// A job with no required skills is fully matched by every applicant.
pub fn match_percentage(applicant_skills: &SkillSet, job: &Job) -> u8 {
    skill_overlap_percentage(applicant_skills, &job.required_skills)
}

fn skill_overlap_percentage(applicant_skills: &SkillSet, required: &SkillSet) -> u8 {
    let total = required.len();
    if total == 0 {
        return 100;
    }

    let matched = required.overlap(applicant_skills);
    let percentage = (matched * 100 + total / 2) / total;
    percentage.min(100) as u8
}
