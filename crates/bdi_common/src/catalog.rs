//! Symptom Catalog
//!
//! The 21 BDI items, phrased as the quantity the model is asked to judge.
//! Order is the display and iteration order of every analysis run.

use serde::Serialize;

/// One inventory item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SymptomDescriptor {
    /// Stable item identifier ("Q1".."Q21")
    pub id: &'static str,
    /// Natural-language quantity embedded in the prompt
    pub question: &'static str,
}

impl SymptomDescriptor {
    pub const fn new(id: &'static str, question: &'static str) -> Self {
        Self { id, question }
    }
}

/// Number of items in the inventory
pub const SYMPTOM_COUNT: usize = 21;

/// The full inventory, in catalog order
pub static BDI_SYMPTOMS: [SymptomDescriptor; SYMPTOM_COUNT] = [
    SymptomDescriptor::new("Q1", "how sad the user feels"),
    SymptomDescriptor::new("Q2", "how discouraged the user is about future"),
    SymptomDescriptor::new("Q3", "how much the user feels like a failure"),
    SymptomDescriptor::new("Q4", "how much the user loses pleasure from things"),
    SymptomDescriptor::new("Q5", "how often the user feels guilty"),
    SymptomDescriptor::new("Q6", "how much the user feels punished"),
    SymptomDescriptor::new("Q7", "how much the user feels disappointed about him/herself"),
    SymptomDescriptor::new("Q8", "how often the user criticizes or blames him/herself"),
    SymptomDescriptor::new("Q9", "how much the user thinks about killing him/herself"),
    SymptomDescriptor::new("Q10", "how often the user cries"),
    SymptomDescriptor::new("Q11", "how much the user feels restless or agitated"),
    SymptomDescriptor::new("Q12", "how much the user loses interest in things"),
    SymptomDescriptor::new("Q13", "how difficult the user to make decisions"),
    SymptomDescriptor::new("Q14", "how much the user feels worthless"),
    SymptomDescriptor::new("Q15", "how much the user loses energy"),
    SymptomDescriptor::new("Q16", "how much the user experienced changes in sleeping"),
    SymptomDescriptor::new("Q17", "how much the user feels irritable"),
    SymptomDescriptor::new("Q18", "how much the user experienced changes in appetite"),
    SymptomDescriptor::new("Q19", "how difficult the user to concentrate"),
    SymptomDescriptor::new("Q20", "how much the user feels tired or fatigued"),
    SymptomDescriptor::new("Q21", "how much the user loses interest in sex"),
];

/// Look up a descriptor by id (case-insensitive)
pub fn find_symptom(id: &str) -> Option<&'static SymptomDescriptor> {
    BDI_SYMPTOMS.iter().find(|s| s.id.eq_ignore_ascii_case(id))
}
