//! Annotation emitters: the double-colon text form and the JSON form.

use crate::chart::Chart;
use serde::{Deserialize, Serialize};

/// One token in JSON annotation output
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenAnnotation {
    /// `start-end` span in Unicode scalar offsets into the original line
    pub span: String,
    #[serde(rename = "type")]
    pub token_type: String,
    #[serde(rename = "sem-class", skip_serializing_if = "Option::is_none")]
    pub sem_class: Option<String>,
    pub surf: String,
}

/// One line's chart in JSON annotation output
#[derive(Debug, Serialize, Deserialize)]
pub struct LineAnnotation {
    #[serde(rename = "ID")]
    pub id: String,
    pub snt: String,
    pub chart: Vec<TokenAnnotation>,
}

impl LineAnnotation {
    pub fn from_chart(chart: &Chart) -> Self {
        Self {
            id: chart.line_id.clone(),
            snt: chart.orig.clone(),
            chart: chart
                .tokens()
                .iter()
                .map(|t| TokenAnnotation {
                    span: format!("{}-{}", t.start, t.end),
                    token_type: t.ttype.as_str().to_string(),
                    sem_class: t.sem_class.clone(),
                    surf: t.surface.clone(),
                })
                .collect(),
        }
    }
}

/// `::line N ::s <original>` followed by one `::span` line per token
pub fn to_double_colon(chart: &Chart) -> String {
    let mut out = String::new();
    out.push_str(&format!("::line {} ::s {}\n", chart.line_id, chart.orig));
    for t in chart.tokens() {
        out.push_str(&format!("::span {}-{} ::type {} ", t.start, t.end, t.ttype));
        if let Some(sem) = &t.sem_class {
            out.push_str(&format!("::sem-class {sem} "));
        }
        out.push_str(&format!("::surf {}\n", t.surface));
    }
    out
}

/// JSON object for one line (non-ASCII kept unescaped by serde_json)
pub fn to_json(chart: &Chart) -> serde_json::Value {
    serde_json::to_value(LineAnnotation::from_chart(chart)).expect("annotation serializes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Token, TokenType};

    fn sample_chart() -> Chart {
        let mut chart = Chart::new("Mr. X", "7");
        let mut t = Token::new("Mr.", 0, 3, TokenType::Abbrev);
        t.sem_class = Some("pre-name-title".to_string());
        chart.push(t);
        chart.push(Token::new("X", 4, 5, TokenType::WordB));
        chart.finalize();
        chart
    }

    #[test]
    fn double_colon_format() {
        let chart = sample_chart();
        let out = to_double_colon(&chart);
        assert_eq!(
            out,
            "::line 7 ::s Mr. X\n\
             ::span 0-3 ::type ABBREV ::sem-class pre-name-title ::surf Mr.\n\
             ::span 4-5 ::type WORD-B ::surf X\n"
        );
    }

    #[test]
    fn json_format() {
        let chart = sample_chart();
        let v = to_json(&chart);
        assert_eq!(v["ID"], "7");
        assert_eq!(v["snt"], "Mr. X");
        assert_eq!(v["chart"][0]["span"], "0-3");
        assert_eq!(v["chart"][0]["type"], "ABBREV");
        assert_eq!(v["chart"][0]["sem-class"], "pre-name-title");
        assert_eq!(v["chart"][1]["surf"], "X");
        assert!(v["chart"][1].get("sem-class").is_none());
    }
}
