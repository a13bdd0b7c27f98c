//! Multi-step resume form state.
//!
//! The editor walks four steps (personal info, experience, education, skills).
//! Every edit goes through `reduce`, which returns a new `FormState` and never
//! mutates the previous one, so the client can keep history or diff states.

pub mod handlers;

use serde::{Deserialize, Serialize};

use crate::models::resume::{Education, Experience, Resume, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStep {
    PersonalInfo,
    Experience,
    Education,
    Skills,
}

impl FormStep {
    const ORDER: [FormStep; 4] = [
        FormStep::PersonalInfo,
        FormStep::Experience,
        FormStep::Education,
        FormStep::Skills,
    ];

    pub fn index(self) -> usize {
        match self {
            FormStep::PersonalInfo => 0,
            FormStep::Experience => 1,
            FormStep::Education => 2,
            FormStep::Skills => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ORDER.get(index).copied()
    }

    fn next(self) -> Self {
        Self::from_index(self.index() + 1).unwrap_or(self)
    }

    fn previous(self) -> Self {
        self.index()
            .checked_sub(1)
            .and_then(Self::from_index)
            .unwrap_or(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PersonalField {
    FullName,
    Email,
    Phone,
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExperienceField {
    Company,
    Position,
    StartDate,
    EndDate,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EducationField {
    School,
    Degree,
    GraduationDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormAction {
    SetPersonal { field: PersonalField, value: String },
    SetSummary { value: String },
    AddExperience,
    UpdateExperience { index: usize, field: ExperienceField, value: String },
    AddEducation,
    UpdateEducation { index: usize, field: EducationField, value: String },
    AddSkill,
    UpdateSkill { index: usize, value: String },
    SetTemplate { template: Template },
    Next,
    Back,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub step: FormStep,
    pub resume: Resume,
}

impl Default for FormState {
    /// A fresh form shows one empty row in each repeatable section.
    fn default() -> Self {
        Self {
            step: FormStep::PersonalInfo,
            resume: Resume {
                experience: vec![Experience::default()],
                education: vec![Education::default()],
                skills: vec![String::new()],
                ..Default::default()
            },
        }
    }
}

impl FormState {
    /// The last step submits the form instead of advancing.
    pub fn is_final_step(&self) -> bool {
        self.step == FormStep::Skills
    }
}

/// Applies one edit and returns the resulting state.
///
/// Updates addressed to an index that does not exist are ignored.
pub fn reduce(state: &FormState, action: FormAction) -> FormState {
    let mut next = state.clone();
    match action {
        FormAction::SetPersonal { field, value } => {
            let info = &mut next.resume.personal_info;
            match field {
                PersonalField::FullName => info.full_name = value,
                PersonalField::Email => info.email = value,
                PersonalField::Phone => info.phone = value,
                PersonalField::Location => info.location = value,
            }
        }
        FormAction::SetSummary { value } => next.resume.summary = value,
        FormAction::AddExperience => next.resume.experience.push(Experience::default()),
        FormAction::UpdateExperience {
            index,
            field,
            value,
        } => {
            if let Some(entry) = next.resume.experience.get_mut(index) {
                match field {
                    ExperienceField::Company => entry.company = value,
                    ExperienceField::Position => entry.position = value,
                    ExperienceField::StartDate => entry.start_date = value,
                    ExperienceField::EndDate => entry.end_date = value,
                    ExperienceField::Description => entry.description = value,
                }
            }
        }
        FormAction::AddEducation => next.resume.education.push(Education::default()),
        FormAction::UpdateEducation {
            index,
            field,
            value,
        } => {
            if let Some(entry) = next.resume.education.get_mut(index) {
                match field {
                    EducationField::School => entry.school = value,
                    EducationField::Degree => entry.degree = value,
                    EducationField::GraduationDate => entry.graduation_date = value,
                }
            }
        }
        FormAction::AddSkill => next.resume.skills.push(String::new()),
        FormAction::UpdateSkill { index, value } => {
            if let Some(skill) = next.resume.skills.get_mut(index) {
                *skill = value;
            }
        }
        FormAction::SetTemplate { template } => next.resume.template = template,
        FormAction::Next => next.step = state.step.next(),
        FormAction::Back => next.step = state.step.previous(),
    }
    next
}
