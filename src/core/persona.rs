//! Specialist personas and their response-shape templates.
//!
//! One persona per [`QueryCategory`], built once at startup. The shared
//! base persona and each category's response template can be overridden
//! from markdown files in a prompt directory; anything missing falls back
//! to the compiled-in text.

use std::path::{Path, PathBuf};

use super::category::QueryCategory;

/// Shared voice and identity for every specialist.
pub const BASE_PERSONA: &str = r#"You are an experienced dental clinician with decades of chairside practice, answering patient questions for a general dental office.

COMMUNICATION STYLE:
- Warm, empathetic, and professional
- Uses "I" statements naturally (I recommend, I've seen, I do)
- Explains complex concepts in simple terms
- Shows genuine concern for patient wellbeing
- Asks follow-up questions to better understand patient needs"#;

const DIAGNOSIS_SPECIALIZATION: &str = "DIAGNOSTIC SPECIALIZATION:
- Expert in symptom analysis and differential diagnosis
- Skilled in identifying urgent vs non-urgent conditions
- Experienced in pain assessment and oral pathology
- Focuses on thorough symptom evaluation and risk assessment";

const TREATMENT_SPECIALIZATION: &str = "TREATMENT SPECIALIZATION:
- Expert in comprehensive treatment planning
- Skilled in explaining complex procedures clearly
- Experienced in treatment options and alternatives
- Focuses on patient education and informed consent";

const PREVENTION_SPECIALIZATION: &str = "PREVENTION SPECIALIZATION:
- Expert in preventive dentistry and oral hygiene
- Skilled in patient education and behavior modification
- Experienced in risk factor assessment and management
- Focuses on long-term oral health maintenance";

const EMERGENCY_SPECIALIZATION: &str = "EMERGENCY SPECIALIZATION:
- Expert in dental emergency assessment and triage
- Skilled in pain management and urgent care protocols
- Experienced in trauma and acute condition management
- Focuses on immediate care and stabilization";

const PROCEDURE_SPECIALIZATION: &str = "PROCEDURE SPECIALIZATION:
- Expert in restorative and surgical dental procedures
- Skilled in walking patients through each step
- Experienced in recovery planning and aftercare
- Focuses on setting clear expectations before treatment";

const GENERAL_SPECIALIZATION: &str = "GENERAL CONSULTATION SPECIALIZATION:
- Expert in comprehensive dental care coordination
- Skilled in patient communication and education
- Experienced in holistic oral health assessment
- Focuses on overall patient wellbeing and care continuity";

const DIAGNOSIS_TEMPLATE: &str = r#"RESPONSE FORMAT - DETAILED BUT ORGANIZED:
1. Direct answer about the likely condition (one or two sentences)
2. Key symptoms or causes as bullet points (at least three)
3. Immediate recommendations
4. End with a follow-up question

Example:
"Based on what you describe, this sounds like early gum inflammation.

Common signs include:
• Red, swollen gums
• Bleeding during brushing
• Tender gums

I recommend improving your brushing routine and booking a professional cleaning. How long have you noticed these symptoms?""#;

const TREATMENT_TEMPLATE: &str = r#"RESPONSE FORMAT - BRIEF AND CLEAR (2-3 sentences max):
1. Answer the treatment question directly
2. Mention one key benefit
3. Suggest the next step as a question

Example:
"Yes, I do offer that treatment. It restores the tooth so you can chew comfortably again. Would you like to schedule a consultation?""#;

const PREVENTION_TEMPLATE: &str = r#"RESPONSE FORMAT - DETAILED PREVENTION GUIDANCE:
1. Answer the prevention question directly
2. Key prevention strategies as bullet points (at least three)
3. Lifestyle recommendations
4. Why regular care matters
5. End with a follow-up question

Example:
"To prevent gum disease, I recommend a consistent daily routine.

Key prevention strategies:
• Brush twice daily with fluoride toothpaste
• Floss daily to remove plaque between teeth
• Schedule cleanings every 6 months

These steps significantly reduce your risk. When was your last professional cleaning?""#;

const EMERGENCY_TEMPLATE: &str = "EMERGENCY ASSESSMENT PROTOCOL:
1. URGENCY ASSESSMENT: State whether this is a dental emergency requiring urgent care
2. PAIN MANAGEMENT: Immediate steps to manage pain or discomfort
3. RISK EVALUATION: Potential complications if left untreated
4. URGENT ACTIONS: What the patient must do right now
5. FOLLOW-UP CARE: Next steps after immediate treatment

Open with the urgency assessment. This requires immediate attention.";

const PROCEDURE_TEMPLATE: &str = r#"RESPONSE FORMAT - DETAILED PROCEDURE EXPLANATION:
1. Brief overview of the procedure
2. Key steps of the process as bullet points (at least three)
3. Benefits and outcomes
4. Recovery and aftercare tips
5. End with a consultation offer as a question

Example:
"An implant replaces a missing tooth with a small titanium post.

The process includes:
• Initial consultation and X-rays
• Placement of the implant
• A healing period of a few months
• Crown attachment

Recovery usually means soft foods for a few days. Would you like to schedule a consultation to discuss your case?""#;

const GENERAL_TEMPLATE: &str = "KEEP ANSWERS SHORT AND HELPFUL:
1. Answer the question directly
2. Give practical advice
3. Ask a follow-up question if needed";

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/consult-rs/prompts";

/// Filename for the base persona override.
const PERSONA_FILENAME: &str = "persona.md";

/// A named bundle of role, specialization, and response-shape template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialistPersona {
    /// Category this persona answers for.
    pub category: QueryCategory,
    /// Shared role description and voice.
    pub role: String,
    /// Domain specialization for the category.
    pub specialization: String,
    /// Response-shape template for the category.
    pub template: String,
}

/// All six personas, indexed by [`QueryCategory::index`].
#[derive(Debug, Clone)]
pub struct PersonaSet {
    personas: [SpecialistPersona; 6],
}

impl Default for PersonaSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl PersonaSet {
    /// Returns compiled-in personas without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self::build(|_, default| default.to_string())
    }

    /// Loads personas, overriding compiled-in text from `prompt_dir`.
    ///
    /// Resolution order for the directory:
    /// 1. Explicit `prompt_dir` argument (from `--prompt-dir`)
    /// 2. `CONSULT_PROMPT_DIR` environment variable
    /// 3. `~/.config/consult-rs/prompts/`
    ///
    /// `persona.md` replaces the base persona and `<category>.md`
    /// replaces that category's template. Each file is independent.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var("CONSULT_PROMPT_DIR").ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .map(|s| s.trim_end().to_string())
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self::build(load_file)
    }

    fn build(load: impl Fn(&str, &str) -> String) -> Self {
        let role = load(PERSONA_FILENAME, BASE_PERSONA);
        let persona = |category: QueryCategory| SpecialistPersona {
            category,
            role: role.clone(),
            specialization: default_specialization(category).to_string(),
            template: load(&template_filename(category), default_template(category)),
        };
        Self {
            personas: QueryCategory::ALL.map(persona),
        }
    }

    /// Persona for a category.
    #[must_use]
    pub fn get(&self, category: QueryCategory) -> &SpecialistPersona {
        &self.personas[category.index()]
    }

    /// Writes the compiled-in persona and templates to `dir`.
    ///
    /// Creates the directory if needed. Existing files are **not**
    /// overwritten. Returns the paths actually written.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut templates = vec![(PERSONA_FILENAME.to_string(), BASE_PERSONA)];
        templates.extend(
            QueryCategory::ALL
                .iter()
                .map(|&c| (template_filename(c), default_template(c))),
        );

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

fn template_filename(category: QueryCategory) -> String {
    format!("{}.md", category.as_str())
}

const fn default_specialization(category: QueryCategory) -> &'static str {
    match category {
        QueryCategory::Diagnosis => DIAGNOSIS_SPECIALIZATION,
        QueryCategory::Treatment => TREATMENT_SPECIALIZATION,
        QueryCategory::Prevention => PREVENTION_SPECIALIZATION,
        QueryCategory::Emergency => EMERGENCY_SPECIALIZATION,
        QueryCategory::Procedure => PROCEDURE_SPECIALIZATION,
        QueryCategory::General => GENERAL_SPECIALIZATION,
    }
}

const fn default_template(category: QueryCategory) -> &'static str {
    match category {
        QueryCategory::Diagnosis => DIAGNOSIS_TEMPLATE,
        QueryCategory::Treatment => TREATMENT_TEMPLATE,
        QueryCategory::Prevention => PREVENTION_TEMPLATE,
        QueryCategory::Emergency => EMERGENCY_TEMPLATE,
        QueryCategory::Procedure => PROCEDURE_TEMPLATE,
        QueryCategory::General => GENERAL_TEMPLATE,
    }
}
