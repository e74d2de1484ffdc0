//! Requirement trees and course records as shipped by the course data source.
//!
//! The export is crowd-sourced, so decoding is deliberately loose: every node goes
//! through [`RawRequirement`], which accepts strings, numbers and booleans in any
//! scalar field, and unknown node tags decode to [`RequirementNode::Unknown`].

use enum_kinds::EnumKind;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// Canonical course identifier, `"<DEPT> <NUMBER>"`.
pub type CourseId = String;

/// Combination logic of a requirement group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Logic {
    OneOf,
    AllOf,
    TwoOf,
}

impl Logic {
    /// Anything that is not `ONE_OF` or `TWO_OF` is read as `ALL_OF`.
    pub fn from_tag(tag: Option<&str>) -> Logic {
        match tag.map(str::trim) {
            Some("ONE_OF") => Logic::OneOf,
            Some("TWO_OF") => Logic::TwoOf,
            _ => Logic::AllOf,
        }
    }
}

/// A reference to a single course inside a requirement tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CourseRef {
    pub id: CourseId,
    pub min_grade: Option<String>,
    pub concurrency_allowed: Option<bool>,
    pub or_equivalent: Option<bool>,
}

impl CourseRef {
    pub fn new(id: impl Into<CourseId>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    pub fn with_min_grade(mut self, grade: &str) -> Self {
        self.min_grade = Some(grade.to_string());
        self
    }
}

/// A "N credits / N courses from ..." requirement. Only ever displayed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CountReq {
    pub amount: f64,
    pub department: Option<String>,
    pub level: Option<String>,
    pub min_grade: Option<String>,
    pub concurrency_allowed: Option<bool>,
}

/// One node of a recursive requirement tree.
///
/// A course whose tree is `null` is represented by `Option::<RequirementNode>::None`
/// on the [`CourseRecord`]; that is "no prerequisites", which is distinct from a
/// course missing from the catalog altogether.
#[derive(Debug, Clone, PartialEq, EnumKind, Deserialize)]
#[enum_kind(RequirementKind, derive(Hash, PartialOrd, Ord))]
#[serde(from = "RawRequirement")]
pub enum RequirementNode {
    Group { logic: Logic, children: Vec<RequirementNode> },
    Course(CourseRef),
    CreditCount(CountReq),
    CourseCount(CountReq),
    Program { program: String },
    Gpa { min_cgpa: Option<String>, min_udgpa: Option<String> },
    Note { text: String },
    Other { text: String },
    Permission { text: String },
    /// A tag this crate does not know. Never contributes to the graph.
    Unknown { tag: String },
}

impl RequirementNode {
    pub fn group(logic: Logic, children: Vec<RequirementNode>) -> Self {
        RequirementNode::Group { logic, children }
    }

    pub fn course(id: &str) -> Self {
        RequirementNode::Course(CourseRef::new(id))
    }

    pub fn kind(&self) -> RequirementKind {
        RequirementKind::from(self)
    }
}

/// Build the canonical id from the structured `{department, number}` shape.
pub fn canonical_course_id(department: &str, number: &str) -> CourseId {
    format!(
        "{} {}",
        department.trim().to_ascii_uppercase(),
        number.trim().to_ascii_uppercase()
    )
}

/// Normalise the free-text `course` shape.
///
/// `"econ 103"` and `"ECON103"` both become `"ECON 103"`; anything that does not
/// look like a department code followed by a number (`"Pre-Calculus 12"`) only has
/// its whitespace collapsed.
pub fn canonical_course_text(text: &str) -> CourseId {
    let words: Vec<&str> = text.split_whitespace().collect();
    match words.as_slice() {
        [dept, number] if is_department_code(dept) && starts_with_digit(number) => {
            canonical_course_id(dept, number)
        }
        [joined] => match joined.find(|c: char| c.is_ascii_digit()) {
            Some(split) if split > 0 && is_department_code(&joined[..split]) => {
                canonical_course_id(&joined[..split], &joined[split..])
            }
            _ => joined.to_string(),
        },
        _ => words.join(" "),
    }
}

fn is_department_code(s: &str) -> bool {
    (2..=5).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphabetic())
}

fn starts_with_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// A course as exported by the data source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CourseRecord {
    pub dept: String,
    pub number: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Free-text prerequisite string, kept for traceability.
    #[serde(default, rename = "prerequisites")]
    pub prerequisite_text: Option<String>,
    #[serde(default)]
    pub corequisites: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, rename = "parsed_prerequisites")]
    pub requirements: Option<RequirementNode>,
}

impl CourseRecord {
    pub fn new(dept: &str, number: &str, title: &str, requirements: Option<RequirementNode>) -> Self {
        Self {
            dept: dept.to_string(),
            number: number.to_string(),
            title: Some(title.to_string()),
            description: None,
            prerequisite_text: None,
            corequisites: None,
            notes: None,
            requirements,
        }
    }

    pub fn id(&self) -> CourseId {
        canonical_course_id(&self.dept, &self.number)
    }
}

// ============================================================================
// Loose decoding
// ============================================================================

/// Any JSON scalar. Objects and arrays in a scalar slot are swallowed as `Ignored`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Ignored(IgnoredAny),
}

impl Scalar {
    fn text(&self) -> Option<String> {
        let s = match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s.trim().to_string(),
            Scalar::Ignored(_) => return None,
        };
        (!s.is_empty()).then_some(s)
    }

    fn flag(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            Scalar::Int(i) => Some(*i != 0),
            Scalar::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            Scalar::Float(_) | Scalar::Ignored(_) => None,
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Bool(_) | Scalar::Ignored(_) => None,
        }
    }
}

/// Every field any historical node shape has used.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawRequirement {
    #[serde(rename = "type")]
    tag: Option<Scalar>,
    logic: Option<Scalar>,
    children: Option<Vec<Option<RequirementNode>>>,
    department: Option<Scalar>,
    number: Option<Scalar>,
    course: Option<Scalar>,
    min_grade: Option<Scalar>,
    #[serde(alias = "concurrencyAllowed")]
    can_be_taken_concurrently: Option<Scalar>,
    or_equivalent: Option<Scalar>,
    count: Option<Scalar>,
    credits: Option<Scalar>,
    credit_count: Option<Scalar>,
    level: Option<Scalar>,
    program: Option<Scalar>,
    #[serde(rename = "minCGPA")]
    min_cgpa: Option<Scalar>,
    #[serde(rename = "minUDGPA")]
    min_udgpa: Option<Scalar>,
    note: Option<Scalar>,
    text: Option<Scalar>,
}

fn text_of(field: &Option<Scalar>) -> Option<String> {
    field.as_ref().and_then(Scalar::text)
}

impl RawRequirement {
    fn course_ref(&self) -> Option<CourseRef> {
        let id = match (text_of(&self.department), text_of(&self.number)) {
            (Some(dept), Some(number)) => canonical_course_id(&dept, &number),
            _ => canonical_course_text(&text_of(&self.course)?),
        };
        Some(CourseRef {
            id,
            min_grade: text_of(&self.min_grade),
            concurrency_allowed: self.can_be_taken_concurrently.as_ref().and_then(Scalar::flag),
            or_equivalent: self.or_equivalent.as_ref().and_then(Scalar::flag),
        })
    }

    fn count_req(&self, amount: &Option<Scalar>) -> CountReq {
        CountReq {
            amount: amount.as_ref().and_then(Scalar::number).unwrap_or(0.0),
            department: text_of(&self.department),
            level: text_of(&self.level),
            min_grade: text_of(&self.min_grade),
            concurrency_allowed: self.can_be_taken_concurrently.as_ref().and_then(Scalar::flag),
        }
    }

    fn free_text(&self) -> String {
        text_of(&self.text).or_else(|| text_of(&self.note)).unwrap_or_default()
    }
}

impl From<RawRequirement> for RequirementNode {
    fn from(raw: RawRequirement) -> Self {
        let tag = text_of(&raw.tag).unwrap_or_default();
        match tag.as_str() {
            "group" => RequirementNode::Group {
                logic: Logic::from_tag(text_of(&raw.logic).as_deref()),
                children: raw.children.unwrap_or_default().into_iter().flatten().collect(),
            },
            "course" | "HSCourse" | "transcript" => match raw.course_ref() {
                Some(course) => RequirementNode::Course(course),
                None => RequirementNode::Unknown { tag },
            },
            "creditCount" => {
                let amount = if raw.credits.is_some() { &raw.credits } else { &raw.credit_count };
                RequirementNode::CreditCount(raw.count_req(amount))
            }
            "courseCount" => RequirementNode::CourseCount(raw.count_req(&raw.count)),
            "program" => RequirementNode::Program {
                program: text_of(&raw.program).unwrap_or_else(|| raw.free_text()),
            },
            "gpa" | "cgpa" => RequirementNode::Gpa {
                min_cgpa: text_of(&raw.min_cgpa),
                min_udgpa: text_of(&raw.min_udgpa),
            },
            "note" => RequirementNode::Note { text: raw.free_text() },
            "other" => RequirementNode::Other { text: raw.free_text() },
            "permission" => RequirementNode::Permission { text: raw.free_text() },
            _ => RequirementNode::Unknown { tag },
        }
    }
}
