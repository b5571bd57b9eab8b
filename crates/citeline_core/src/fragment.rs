use serde::{Deserialize, Serialize};

/// Structured, non-text payload attached to a message. Never mutated once
/// appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiFragment {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub body: FragmentBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FragmentBody {
    InfoCard(InfoCard),
    DataTable(DataTable),
    Chart(ChartSpec),
    SourceCard(SourceCard),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoCard {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTable {
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// `bar`, `line` or `pie`; passed through to the renderer untouched.
    pub chart_type: String,
    pub title: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<ChartDataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    #[serde(default)]
    pub label: Option<String>,
    /// `None` where the producer had no value for a label.
    #[serde(default)]
    pub data: Vec<Option<f64>>,
}

/// Metadata card for a cited document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCard {
    #[serde(rename = "pdf_id")]
    pub document_id: String,
    pub filename: String,
    pub title: String,
    pub page_count: u32,
    #[serde(default)]
    pub relevant_pages: Vec<u32>,
    #[serde(default)]
    pub snippet: String,
}

impl FragmentBody {
    pub fn kind_name(&self) -> &'static str {
        match self {
            FragmentBody::InfoCard(_) => "info_card",
            FragmentBody::DataTable(_) => "data_table",
            FragmentBody::Chart(_) => "chart",
            FragmentBody::SourceCard(_) => "source_card",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FragmentBody, UiFragment};

    #[test]
    fn source_card_decodes_from_wire_shape() {
        let json = r#"{"id":"f1","type":"source_card","data":{"pdf_id":"doc7",
            "filename":"a.pdf","title":"A","page_count":12,"relevant_pages":[3,4],
            "snippet":"..."}}"#;
        let fragment: UiFragment = serde_json::from_str(json).unwrap();

        assert_eq!(fragment.id, "f1");
        match fragment.body {
            FragmentBody::SourceCard(card) => {
                assert_eq!(card.document_id, "doc7");
                assert_eq!(card.relevant_pages, vec![3, 4]);
            }
            other => panic!("unexpected fragment {other:?}"),
        }
    }

    #[test]
    fn missing_id_decodes_as_empty() {
        let json = r#"{"type":"info_card","data":{"title":"T","content":"C"}}"#;
        let fragment: UiFragment = serde_json::from_str(json).unwrap();
        assert!(fragment.id.is_empty());
        assert_eq!(fragment.body.kind_name(), "info_card");
    }

    #[test]
    fn chart_points_may_be_missing() {
        let json = r#"{"type":"chart","data":{"chart_type":"line","title":"Revenue",
            "labels":["Q1","Q2","Q3"],"datasets":[{"label":"2024","data":[1.5,null,3]}]}}"#;
        let fragment: UiFragment = serde_json::from_str(json).unwrap();
        match fragment.body {
            FragmentBody::Chart(chart) => {
                assert_eq!(chart.datasets[0].data, vec![Some(1.5), None, Some(3.0)]);
            }
            other => panic!("unexpected fragment {other:?}"),
        }
    }
}
