//! Reply format instructions handed to the model alongside the prompt.

/// Which reply shape the prompt asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    /// One composition on the final line
    Single,
    /// Up to five indexed compositions
    Multi,
    /// Analysis, recommendations and indexed compositions
    Analysis,
}

const SINGLE: &str = r#"Expected output format for composition:

**COMPOSITION:**
composition = {"Element1": fraction1, "Element2": fraction2, ...}

Requirements:
- Write the composition as a dictionary literal
- Every fraction is a number between 0 and 1
- Fractions sum to 1.0
- Keys are chemical element symbols
- The composition line is the last line of the reply

Example:
composition = {"Ni": 0.6, "Cu": 0.4}
"#;

const MULTI: &str = r#"Expected output format for multiple compositions:

**COMPOSITIONS:**
composition_1 = {"Element1": fraction1, "Element2": fraction2, ...}
composition_2 = {"Element1": fraction1, "Element2": fraction2, ...}
composition_3 = {"Element1": fraction1, "Element2": fraction2, ...}
[Add more compositions as needed, up to 5 total]

Requirements:
- Write each composition as a dictionary literal
- Every fraction is a number between 0 and 1
- Fractions in each composition sum to 1.0
- Keys are chemical element symbols
- Order compositions by predicted performance, best first
- Give 3-5 compositions unless fewer promising candidates exist

Example:
composition_1 = {"Ni": 0.6, "Cu": 0.4}
composition_2 = {"Ni": 0.7, "Cu": 0.3}
composition_3 = {"Pd": 0.5, "Ag": 0.5}
"#;

const ANALYSIS: &str = r#"Expected output format:

**ANALYSIS:**
[Scientific reasoning for each candidate]

**RECOMMENDATIONS:**
[Ranked recommendations with supporting evidence for each composition]

**COMPOSITIONS:**
composition_1 = {"Element1": fraction1, "Element2": fraction2}
composition_2 = {"Element1": fraction1, "Element2": fraction2}
composition_3 = {"Element1": fraction1, "Element2": fraction2}
[Add more as needed, up to 5 total]
"#;

impl ReplyFormat {
    pub fn instructions(self) -> &'static str {
        match self {
            Self::Single => SINGLE,
            Self::Multi => MULTI,
            Self::Analysis => ANALYSIS,
        }
    }
}
