use std::fmt::Write as _;

use citeline_core::{
    AppViewModel, Block, Citation, DocumentRow, FragmentBody, Inline, MessageView, RenderTree,
    Role, SearchState, StatusLine, ToolCallKind, ToolCallState, UiFragment, ViewerView,
};

use super::constants::*;

/// Turns successive view models into terminal output, printing only what
/// changed since the previous frame.
#[derive(Debug, Default)]
pub struct Renderer {
    printed_messages: usize,
    status: Option<StatusLine>,
    viewer: Option<ViewerView>,
    notice: Option<String>,
    documents: Vec<DocumentRow>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&mut self, view: &AppViewModel) -> String {
        let mut out = String::new();

        // finished messages print once, in order. The last message waits for
        // the turn to end, since citations may still follow its final delta.
        while let Some(message) = view.messages.get(self.printed_messages) {
            let turn_open = view.is_loading && self.printed_messages + 1 == view.messages.len();
            if message.streaming || turn_open {
                break;
            }
            out.push_str(&format_message(message));
            self.printed_messages += 1;
        }

        if view.status_line != self.status {
            if let Some(status) = &view.status_line {
                let _ = writeln!(out, "{}", format_status(status));
            }
            self.status = view.status_line.clone();
        }

        if self.viewer.as_ref() != Some(&view.viewer) {
            let previous = self.viewer.replace(view.viewer.clone());
            let was_open = previous.as_ref().is_some_and(|viewer| viewer.open);
            if view.viewer.open || was_open {
                out.push_str(&format_viewer(&view.viewer));
            }
        }

        if view.notice != self.notice {
            if let Some(notice) = &view.notice {
                let _ = writeln!(out, "{NOTICE_PREFIX}{notice}");
            }
            self.notice = view.notice.clone();
        }

        if view.documents != self.documents {
            out.push_str(&format_documents(&view.documents));
            self.documents = view.documents.clone();
        }

        out
    }
}

pub fn format_message(message: &MessageView) -> String {
    let mut out = String::new();
    match message.role {
        Role::User => {
            let _ = writeln!(out, "{USER_PREFIX}{}", message.content);
            return out;
        }
        Role::Assistant => {
            let _ = writeln!(out, "[{}]", message.id);
        }
    }

    out.push_str(&format_tree(&message.tree));
    if !message.citations.is_empty() {
        out.push_str(SOURCES_HEADER);
        out.push('\n');
        for citation in &message.citations {
            out.push_str(&format_citation(citation));
        }
    }
    for fragment in &message.fragments {
        out.push_str(&format_fragment(fragment));
    }
    out.push('\n');
    out
}

pub fn format_tree(tree: &RenderTree) -> String {
    let mut out = String::new();
    for (index, block) in tree.blocks.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        match block {
            Block::Paragraph(inlines) => {
                let _ = writeln!(out, "{}", format_inlines(inlines));
            }
            Block::Code { language, code } => {
                let _ = writeln!(out, "```{}", language.as_deref().unwrap_or(""));
                for line in code.lines() {
                    let _ = writeln!(out, "{CODE_INDENT}{line}");
                }
                out.push_str("```\n");
            }
            Block::BulletList(items) => {
                for item in items {
                    let _ = writeln!(out, "  {BULLET} {}", format_inlines(&item.content));
                }
            }
            Block::NumberedList(items) => {
                for item in items {
                    let number = item.number.unwrap_or(0);
                    let _ = writeln!(out, "  {number}. {}", format_inlines(&item.content));
                }
            }
        }
    }
    out
}

fn format_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Bold(children) => {
                let _ = write!(out, "**{}**", format_inlines(children));
            }
            Inline::Italic(children) => {
                let _ = write!(out, "_{}_", format_inlines(children));
            }
            Inline::Citation(badge) if badge.is_interactive() => {
                let _ = write!(out, "[{}]", badge.number);
            }
            // unresolved: number only, marked as not clickable
            Inline::Citation(badge) => {
                let _ = write!(out, "[{}?]", badge.number);
            }
            Inline::LineBreak => out.push('\n'),
        }
    }
    out
}

fn format_citation(citation: &Citation) -> String {
    format!(
        "  [{}] {} p.{} \"{}\"\n",
        citation.number,
        citation.document_id,
        citation.page,
        truncate(&citation.snippet, SNIPPET_WIDTH)
    )
}

fn format_fragment(fragment: &UiFragment) -> String {
    let mut out = format!("  <{}>", fragment.body.kind_name());
    match &fragment.body {
        FragmentBody::InfoCard(card) => {
            let icon = card.icon.as_deref().unwrap_or("i");
            let _ = writeln!(out, " ({icon}) {}: {}", card.title, card.content);
        }
        FragmentBody::DataTable(table) => {
            if let Some(caption) = &table.caption {
                let _ = write!(out, " {caption}");
            }
            out.push('\n');
            let _ = writeln!(out, "    | {} |", table.headers.join(" | "));
            for row in &table.rows {
                let _ = writeln!(out, "    | {} |", row.join(" | "));
            }
        }
        FragmentBody::Chart(chart) => {
            let _ = writeln!(out, " {} chart: {}", chart.chart_type, chart.title);
            for dataset in &chart.datasets {
                let values = chart
                    .labels
                    .iter()
                    .zip(&dataset.data)
                    .map(|(label, value)| match value {
                        Some(value) => format!("{label}={value}"),
                        None => format!("{label}=-"),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(out, "    {}: {values}", dataset.label.as_deref().unwrap_or("-"));
            }
        }
        FragmentBody::SourceCard(source) => {
            let pages = source
                .relevant_pages
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(
                out,
                " {} ({}, {} pages) relevant pages: {pages}",
                source.title, source.filename, source.page_count
            );
        }
    }
    out
}

fn format_status(status: &StatusLine) -> String {
    let marker = match status.state {
        ToolCallState::InProgress => "...",
        ToolCallState::Completed => "done",
        ToolCallState::Error => "failed",
    };
    let label = match status.kind {
        ToolCallKind::Thinking => "Thinking",
        ToolCallKind::SearchingDocuments => "Searching documents",
        ToolCallKind::RetrievingPdf => "Retrieving document",
        ToolCallKind::AnalyzingContent => "Analyzing content",
        ToolCallKind::GeneratingResponse => "Generating response",
        ToolCallKind::Other => "Working",
    };
    if status.message.is_empty() {
        format!("{STATUS_PREFIX}{label} {marker}")
    } else {
        format!("{STATUS_PREFIX}{label} {marker} {}", status.message)
    }
}

pub fn format_viewer(viewer: &ViewerView) -> String {
    let mut out = String::new();
    let Some(document_id) = viewer.document_id.as_deref().filter(|_| viewer.open) else {
        let _ = writeln!(out, "{VIEWER_PREFIX}closed");
        return out;
    };

    let pages = match viewer.page_count {
        Some(count) => format!("{}/{count}", viewer.page),
        None => viewer.page.to_string(),
    };
    let _ = write!(
        out,
        "{VIEWER_PREFIX}{document_id} page {pages} zoom {:.0}%",
        viewer.zoom * 100.0
    );
    if let Some(highlight) = &viewer.highlight {
        let _ = write!(out, " highlight \"{}\"", truncate(highlight, SNIPPET_WIDTH));
    }
    out.push('\n');

    match &viewer.search {
        SearchState::Idle => {}
        SearchState::Pending { query, .. } => {
            let _ = writeln!(out, "  searching \"{query}\"...");
        }
        SearchState::Results { query, hits } if hits.is_empty() => {
            let _ = writeln!(out, "  no matches for \"{query}\"");
        }
        SearchState::Results { query, hits } => {
            let _ = writeln!(out, "  {} matches for \"{query}\":", hits.len());
            for (index, hit) in hits.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  ({}) p.{} {}",
                    index + 1,
                    hit.page,
                    truncate(&hit.snippet, SNIPPET_WIDTH)
                );
            }
        }
        SearchState::Failed { query, message } => {
            let _ = writeln!(out, "  search for \"{query}\" failed: {message}");
        }
    }
    out
}

fn format_documents(documents: &[DocumentRow]) -> String {
    if documents.is_empty() {
        return "documents: none\n".to_string();
    }
    let mut out = String::from("documents:\n");
    for doc in documents {
        let mark = if doc.selected { "x" } else { " " };
        let _ = writeln!(
            out,
            "  [{mark}] {} {} ({} pages)",
            doc.id, doc.filename, doc.page_count
        );
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::{format_fragment, format_tree, format_viewer, Renderer};
    use citeline_core::markup::render;
    use citeline_core::{
        update, AppState, ChartDataset, ChartSpec, Citation, CitationRegistry, DataTable,
        FragmentBody, Msg, StreamEvent, UiFragment, ViewerCommand,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn markup_tree_prints_badges_and_lists() {
        let mut registry = CitationRegistry::new();
        registry.register(Citation {
            number: 1,
            document_id: "doc7".to_string(),
            page: 3,
            snippet: "Paris is the capital".to_string(),
            highlight_start: 0,
            highlight_end: 20,
            confidence: 0.9,
        });
        let tree = render("**Paris** is the capital [1] [2].\n\n- one\n- *two*", &registry);
        assert_eq!(
            format_tree(&tree),
            "**Paris** is the capital [1] [2?].\n\n  - one\n  - _two_\n"
        );
    }

    #[test]
    fn finished_messages_print_once() {
        let mut renderer = Renderer::new();
        let (state, effects) = update(AppState::new(), Msg::InputSubmitted("Hi".to_string()));
        let citeline_core::Effect::SubmitTurn { turn_id, .. } = effects[0].clone() else {
            panic!("expected SubmitTurn");
        };

        let first = renderer.frame(&state.view());
        assert!(first.starts_with("> Hi\n"));
        assert!(!first.contains("[msg-"));

        let (state, _) = update(state, Msg::Stream { turn_id, event: StreamEvent::text("Hello", true) });
        let (state, _) = update(state, Msg::Stream { turn_id, event: StreamEvent::done() });
        let second = renderer.frame(&state.view());
        assert!(second.contains("Hello"));
        assert!(!second.contains("> Hi"));

        assert_eq!(renderer.frame(&state.view()), "");
    }

    #[test]
    fn viewer_line_shows_page_zoom_and_results() {
        let (state, _) = update(
            AppState::new(),
            Msg::Viewer(ViewerCommand::Open {
                document_id: "doc7".to_string(),
                page: 3,
                highlight: Some("Paris".to_string()),
            }),
        );
        let (state, _) = update(state, Msg::Viewer(ViewerCommand::ZoomIn));
        assert_eq!(
            format_viewer(&state.view().viewer),
            "viewer: doc7 page 3 zoom 125% highlight \"Paris\"\n"
        );

        let (state, _) = update(state, Msg::Viewer(ViewerCommand::Close));
        assert_eq!(format_viewer(&state.view().viewer), "viewer: closed\n");
    }

    #[test]
    fn fragments_are_labelled_by_kind() {
        let chart = UiFragment {
            id: "f1".to_string(),
            body: FragmentBody::Chart(ChartSpec {
                chart_type: "line".to_string(),
                title: "Revenue".to_string(),
                labels: vec!["Q1".to_string(), "Q2".to_string()],
                datasets: vec![ChartDataset {
                    label: Some("2024".to_string()),
                    data: vec![Some(1.5), None],
                }],
            }),
        };
        assert_eq!(
            format_fragment(&chart),
            "  <chart> line chart: Revenue\n    2024: Q1=1.5, Q2=-\n"
        );

        let table = UiFragment {
            id: "f2".to_string(),
            body: FragmentBody::DataTable(DataTable {
                headers: vec!["City".to_string(), "Pop".to_string()],
                rows: vec![vec!["Paris".to_string(), "2.1M".to_string()]],
                caption: None,
            }),
        };
        assert_eq!(
            format_fragment(&table),
            "  <data_table>\n    | City | Pop |\n    | Paris | 2.1M |\n"
        );
    }
}
