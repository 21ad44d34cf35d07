//! Optional respondent-attribute questions an organization may add to a survey.

use serde::Serialize;

/// How a demographic question is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DemographicInput {
    Select,
    Radio,
}

/// A demographic question from the built-in catalog
#[derive(Debug, Clone, Serialize)]
pub struct DemographicQuestion {
    pub id: &'static str,
    pub text: &'static str,
    #[serde(rename = "type")]
    pub input: DemographicInput,
    pub options: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

/// Id of the question whose options come from the organization's departments
pub const DEPARTMENT_QUESTION_ID: &str = "department";

const YES_NO_DECLINE: &[&str] = &["Oui", "Non", "Préfère ne pas répondre"];
const YES_NO: &[&str] = &["Oui", "Non"];

/// Demographic questions are only recommended from this many respondents up
pub const RECOMMENDED_MIN_RESPONDENTS: u32 = 50;

pub const DEMOGRAPHIC_QUESTIONS: &[DemographicQuestion] = &[
    DemographicQuestion {
        id: "age",
        text: "Quel âge avez-vous?",
        input: DemographicInput::Select,
        options: &["18-24", "25-34", "35-44", "45-54", "55-64", "65+"],
        description: None,
    },
    DemographicQuestion {
        id: "education",
        text: "Quel est le plus haut niveau de scolarité que vous avez atteint?",
        input: DemographicInput::Select,
        options: &[
            "Diplôme d'études secondaires",
            "Diplôme d'études collégiales",
            "Baccalauréat",
            "Maîtrise",
            "Doctorat",
        ],
        description: None,
    },
    DemographicQuestion {
        id: "seniority",
        text: "Quelle réponse parmi les suivantes décrit le mieux votre niveau d'ancienneté au sein de l'entreprise ou de l'organisation?",
        input: DemographicInput::Select,
        options: &["0-2 ans", "3-5 ans", "6-10 ans", "11-15 ans", "16+ ans"],
        description: None,
    },
    DemographicQuestion {
        id: "current_tenure",
        text: "Depuis combien de temps approximativement occupez-vous votre poste actuel avec cet employeur?",
        input: DemographicInput::Select,
        options: &["Moins d'un an", "1-2 ans", "3-5 ans", "6-10 ans", "10+ ans"],
        description: None,
    },
    DemographicQuestion {
        id: "hours",
        text: "En moyenne, combien d'heures de travail totales faites-vous par semaine?",
        input: DemographicInput::Select,
        options: &["Moins de 20h", "20-29h", "30-39h", "40-49h", "50h+"],
        description: None,
    },
    DemographicQuestion {
        id: DEPARTMENT_QUESTION_ID,
        text: "De quel service ou de quelle direction faites-vous partie?",
        input: DemographicInput::Select,
        options: &[],
        description: Some(
            "Pour activer cette question, vous devez sélectionner vos services à l'Étape 1.",
        ),
    },
    DemographicQuestion {
        id: "location",
        text: "Où résidez-vous actuellement?",
        input: DemographicInput::Select,
        options: &["Quebec", "Ontario", "British Columbia", "Alberta", "Other"],
        description: None,
    },
    DemographicQuestion {
        id: "gender",
        text: "Quel est votre genre?",
        input: DemographicInput::Select,
        options: &["Homme", "Femme", "Non-binaire", "Préfère ne pas répondre"],
        description: None,
    },
    DemographicQuestion {
        id: "union",
        text: "Êtes-vous membre d'un syndicat?",
        input: DemographicInput::Radio,
        options: YES_NO_DECLINE,
        description: None,
    },
    DemographicQuestion {
        id: "work_style",
        text: "Travaillez-vous surtout en compagnie d'autres employés, ou travaillez-vous surtout en solo?",
        input: DemographicInput::Radio,
        options: &["En équipe", "En solo", "Les deux"],
        description: None,
    },
    DemographicQuestion {
        id: "manager",
        text: "Dans votre poste, avez-vous une responsabilité de gestionnaire envers d'autres personnes?",
        input: DemographicInput::Radio,
        options: YES_NO,
        description: None,
    },
    DemographicQuestion {
        id: "shift_work",
        text: "Faites-vous des quarts de travail?",
        input: DemographicInput::Radio,
        options: YES_NO,
        description: None,
    },
    DemographicQuestion {
        id: "employment_status",
        text: "Quelle catégorie parmi les suivantes décrit le mieux votre statut d'emploi actuel?",
        input: DemographicInput::Select,
        options: &["Temps plein", "Temps partiel", "Contractuel", "Temporaire"],
        description: None,
    },
    DemographicQuestion {
        id: "indigenous",
        text: "Êtes-vous un Autochtone ou un membre d'une minorité visible (un groupe racialisé)?",
        input: DemographicInput::Radio,
        options: YES_NO_DECLINE,
        description: None,
    },
    DemographicQuestion {
        id: "lgbtq",
        text: "Êtes-vous un membre de la communauté 2ELGBTQI+?",
        input: DemographicInput::Radio,
        options: YES_NO_DECLINE,
        description: None,
    },
    DemographicQuestion {
        id: "immigrant",
        text: "Êtes-vous un immigré dans ce pays?",
        input: DemographicInput::Radio,
        options: YES_NO_DECLINE,
        description: None,
    },
    DemographicQuestion {
        id: "disability",
        text: "Vivez-vous avec un handicap physique ou mental (invisible ou visible)?",
        input: DemographicInput::Radio,
        options: YES_NO_DECLINE,
        description: None,
    },
    DemographicQuestion {
        id: "caregiver",
        text: "Êtes-vous un aidant naturel d'enfants ou d'adultes?",
        input: DemographicInput::Radio,
        options: YES_NO_DECLINE,
        description: None,
    },
];

/// Look up a demographic question by id
pub fn demographic(id: &str) -> Option<&'static DemographicQuestion> {
    DEMOGRAPHIC_QUESTIONS.iter().find(|q| q.id == id)
}

/// Ids of every catalog question, in display order
pub fn all_demographic_ids() -> impl Iterator<Item = &'static str> {
    DEMOGRAPHIC_QUESTIONS.iter().map(|q| q.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_eighteen_questions() {
        assert_eq!(DEMOGRAPHIC_QUESTIONS.len(), 18);
    }

    #[test]
    fn test_lookup_department_question() {
        let q = demographic(DEPARTMENT_QUESTION_ID).unwrap();
        assert!(q.options.is_empty());
        assert!(q.description.is_some());
        assert!(demographic("shoe_size").is_none());
    }
}
