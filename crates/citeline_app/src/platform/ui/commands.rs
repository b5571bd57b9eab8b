use citeline_core::{MessageId, Msg, ViewerCommand};

/// One line typed at the prompt, interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Msg(Msg),
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub const HELP: &str = "\
Type a question to ask it. Commands:
  /cite <message> <n>   open citation [n] of a message (e.g. /cite msg-2 1)
  /open <doc> [page]    open a document in the viewer
  /page <n>  /next  /prev
  /zoom in|out|reset
  /search <text>        search the open document
  /result <n>           jump to search result n
  /dismiss              dismiss search results
  /close                close the viewer
  /upload <path>        upload a PDF
  /docs                 refresh the document list
  /clear-docs           delete every stored document
  /select <doc>         toggle a document as context for questions
  /cancel               abort the answer in progress
  /help  /quit";

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Msg(Msg::InputSubmitted(line.to_string()));
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let viewer = |command| Input::Msg(Msg::Viewer(command));
    match (name, args.as_slice()) {
        ("help" | "h" | "?", _) => Input::Help,
        ("quit" | "q" | "exit", _) => Input::Quit,
        ("cancel", []) => Input::Msg(Msg::CancelClicked),
        ("cite", [message, number]) => match (parse_message_id(message), number.parse::<u32>()) {
            (Some(message_id), Ok(number)) => {
                Input::Msg(Msg::CitationClicked { message_id, number })
            }
            _ => invalid("usage: /cite <message> <n>"),
        },
        ("open", [document_id]) => viewer(ViewerCommand::Open {
            document_id: document_id.to_string(),
            page: 1,
            highlight: None,
        }),
        ("open", [document_id, page]) => match page.parse::<u32>() {
            Ok(page) => viewer(ViewerCommand::Open {
                document_id: document_id.to_string(),
                page,
                highlight: None,
            }),
            Err(_) => invalid("usage: /open <doc> [page]"),
        },
        ("page", [page]) => match page.parse::<u32>() {
            Ok(page) => viewer(ViewerCommand::SetPage(page)),
            Err(_) => invalid("usage: /page <n>"),
        },
        ("next", []) => viewer(ViewerCommand::NextPage),
        ("prev", []) => viewer(ViewerCommand::PreviousPage),
        ("zoom", ["in"]) => viewer(ViewerCommand::ZoomIn),
        ("zoom", ["out"]) => viewer(ViewerCommand::ZoomOut),
        ("zoom", ["reset"]) => viewer(ViewerCommand::ResetZoom),
        ("search", [_, ..]) => viewer(ViewerCommand::Search(rest.to_string())),
        ("result", [index]) => match index.parse::<usize>() {
            Ok(index) if index > 0 => viewer(ViewerCommand::SearchResultClicked(index - 1)),
            _ => invalid("usage: /result <n>"),
        },
        ("dismiss", []) => viewer(ViewerCommand::SearchDismissed),
        ("close", []) => viewer(ViewerCommand::Close),
        ("upload", [_, ..]) => Input::Msg(Msg::UploadRequested {
            path: rest.to_string(),
        }),
        ("docs", []) => Input::Msg(Msg::DocumentsRefreshRequested),
        ("clear-docs", []) => Input::Msg(Msg::ClearDocumentsRequested),
        ("select", [document_id]) => {
            Input::Msg(Msg::DocumentSelectionToggled(document_id.to_string()))
        }
        _ => invalid(&format!("unknown command /{name}, try /help")),
    }
}

fn invalid(reason: &str) -> Input {
    Input::Invalid(reason.to_string())
}

/// Accepts `msg-3` as rendered, or a bare `3`.
fn parse_message_id(text: &str) -> Option<MessageId> {
    text.strip_prefix("msg-")
        .unwrap_or(text)
        .parse()
        .ok()
        .map(MessageId)
}
