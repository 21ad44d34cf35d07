//! Built-in scale question banks for each survey type.

use crate::survey::{Question, SurveyType};

/// Comprehensive assessment bank
const COMPREHENSIVE: &[(&str, &str)] = &[
    (
        "1",
        "Mon employeur m'encourage à prendre les pauses auxquelles j'ai droit.",
    ),
    (
        "2",
        "Je suis en mesure de maintenir un équilibre raisonnable entre mes exigences professionnelles et ma vie personnelle.",
    ),
    (
        "3",
        "Les gens se traitent avec respect dans mon milieu de travail.",
    ),
];

/// Quick pulse check bank
const QUICK: &[(&str, &str)] = &[
    (
        "q1",
        "Je suis en mesure de maintenir un équilibre raisonnable entre mes exigences professionnelles et ma vie personnelle.",
    ),
    (
        "q2",
        "Les gens se traitent avec respect dans mon milieu de travail.",
    ),
    ("q3", "Je sais ce qu'on attend de moi dans mon travail."),
    (
        "q4",
        "Au travail, j'ai le sentiment de faire partie d'une communauté.",
    ),
    ("q5", "Il est sécuritaire de s'exprimer au travail."),
    (
        "q6",
        "La charge de travail que je dois exécuter est raisonnable pour mon poste.",
    ),
];

/// Default ordered question list for a survey type
pub fn question_bank(survey_type: SurveyType) -> Vec<Question> {
    let bank = match survey_type {
        SurveyType::Comprehensive => COMPREHENSIVE,
        SurveyType::Quick => QUICK,
    };
    bank.iter()
        .map(|(id, text)| Question::scale(*id, *text))
        .collect()
}
