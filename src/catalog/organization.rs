//! Option lists for the organization profile form.

pub const EMPLOYEE_COUNT_OPTIONS: &[&str] = &["1-49", "50-99", "100-499", "500-999", "1000+"];

pub const ORGANIZATION_TYPES: &[&str] = &["À but lucratif", "Sans but lucratif", "Pas de réponse"];

pub const SECTOR_TYPES: &[&str] = &["Secteur privé", "Secteur public", "Pas de réponse"];

pub const UNION_STATUS: &[&str] = &[
    "Syndicat",
    "Non syndiqué",
    "Un mélange des deux",
    "Pas de réponse",
];

pub const INDUSTRIES: &[&str] = &[
    "Agriculture, foresterie, pêche et chasse",
    "Extraction minière, exploitation en carrière, et extraction de pétrole et de gaz",
    "Services publics",
    "Construction",
    "Fabrication",
    "Commerce de gros",
    "Commerce de détail",
    "Transport et entreposage",
    "Industrie de l'information et industrie culturelle",
    "Finance et assurances",
    "Services immobiliers et services de location et de location à bail",
    "Services professionnels, scientifiques et techniques",
    "Gestion de sociétés et d'entreprises",
    "Services administratifs, services de soutien, services de gestion des déchets et services d'assainissement",
    "Services d'enseignement",
    "Soins de santé et assistance sociale",
    "Arts, spectacles et loisirs",
    "Services d'hébergement et de restauration",
    "Autres services (sauf les administrations publiques)",
    "Administrations publiques",
];

/// Countries accepted on the signup form (ISO 3166 alpha-2)
pub const SIGNUP_COUNTRIES: &[(&str, &str)] = &[("CA", "Canada"), ("FR", "France"), ("BE", "Belgique")];

/// A report needs at least this many respondents
pub const MIN_REPORT_RESPONDENTS: u32 = 10;
