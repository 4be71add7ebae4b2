//! Course data tree loaded from `course.json`.
//!
//! Every lookup is an in-memory walk of this tree; out-of-range indices
//! read as "absent" rather than panicking.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CourseError;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub modules: Vec<ModuleData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_settings: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ModuleData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pages: Vec<PageData>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    #[serde(default)]
    pub id: String,
    pub url: String,
    /// Present only on quiz pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<QuizData>,
    /// Page hook called on arrival, by registered name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_load: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct QuizData {
    #[serde(default)]
    pub credit: bool,
    /// Answer keys and anything else the quiz page reads.
    #[serde(flatten)]
    pub answers: Map<String, Value>,
}

impl CourseData {
    pub fn from_json(raw: &str) -> Result<Self, CourseError> {
        serde_json::from_str(raw).map_err(|e| CourseError::InvalidCourse(e.to_string()))
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Page count of module `m`, 0 when the module does not exist.
    pub fn page_count(&self, m: usize) -> usize {
        self.modules.get(m).map_or(0, |md| md.pages.len())
    }

    pub fn total_pages(&self) -> usize {
        self.modules.iter().map(|m| m.pages.len()).sum()
    }

    pub fn module_title(&self, m: usize) -> Option<&str> {
        self.modules.get(m).map(|md| md.title.as_str())
    }

    pub fn page(&self, m: usize, p: usize) -> Option<&PageData> {
        self.modules.get(m).and_then(|md| md.pages.get(p))
    }

    pub fn page_url(&self, m: usize, p: usize) -> Option<&str> {
        self.page(m, p).map(|pg| pg.url.as_str())
    }

    pub fn page_id(&self, m: usize, p: usize) -> Option<&str> {
        self.page(m, p).map(|pg| pg.id.as_str())
    }

    pub fn is_quiz(&self, m: usize, p: usize) -> bool {
        self.page(m, p).is_some_and(|pg| pg.quiz.is_some())
    }

    pub fn for_quiz_credit(&self, m: usize, p: usize) -> bool {
        self.page(m, p)
            .and_then(|pg| pg.quiz.as_ref())
            .is_some_and(|q| q.credit)
    }

    pub fn quiz(&self, m: usize, p: usize) -> Option<&QuizData> {
        self.page(m, p).and_then(|pg| pg.quiz.as_ref())
    }

    /// Last module that has at least one page.
    pub(crate) fn last_position(&self) -> Option<(usize, usize)> {
        self.modules
            .iter()
            .enumerate()
            .rev()
            .find(|(_, md)| !md.pages.is_empty())
            .map(|(m, md)| (m, md.pages.len() - 1))
    }

    /// First module that has at least one page.
    pub(crate) fn first_position(&self) -> Option<(usize, usize)> {
        self.modules
            .iter()
            .position(|md| !md.pages.is_empty())
            .map(|m| (m, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COURSE: &str = r#"{
        "title": "Demo",
        "modules": [
            { "title": "Intro", "pages": [
                { "id": "m0p0", "url": "content/mod0/page0.html", "onLoad": "Lesson1Init" },
                { "id": "m0p1", "url": "content/mod0/page1.html" }
            ]},
            { "title": "Empty", "pages": [] },
            { "title": "Check", "pages": [
                { "id": "m2p0", "url": "content/mod2/page0.html",
                  "quiz": { "credit": true, "q1": "b" } }
            ]}
        ],
        "quizSettings": { "passingScore": 80 }
    }"#;

    #[test]
    fn lookups() {
        let c = CourseData::from_json(COURSE).unwrap();
        assert_eq!(c.module_count(), 3);
        assert_eq!(c.page_count(0), 2);
        assert_eq!(c.page_count(9), 0);
        assert_eq!(c.total_pages(), 3);
        assert_eq!(c.page_url(0, 1), Some("content/mod0/page1.html"));
        assert_eq!(c.page_url(1, 0), None);
        assert_eq!(c.page(0, 0).and_then(|p| p.on_load.as_deref()), Some("Lesson1Init"));
        assert!(!c.is_quiz(0, 0));
        assert!(c.is_quiz(2, 0));
        assert!(c.for_quiz_credit(2, 0));
        assert_eq!(c.quiz(2, 0).unwrap().answers.get("q1"), Some(&Value::from("b")));
        assert_eq!(c.first_position(), Some((0, 0)));
        assert_eq!(c.last_position(), Some((2, 0)));
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(matches!(
            CourseData::from_json("{\"modules\": [}"),
            Err(CourseError::InvalidCourse(_))
        ));
    }
}
