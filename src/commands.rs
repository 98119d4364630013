use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Stream(bool),
    Chat(String),
    Export(PathBuf),
    ExportMarkdown(PathBuf),
    Load(PathBuf),
    Clear,
    History,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub const HELP: &str = "\
/stream on|off     toggle streamed answers
/chat <name>       switch conversation
/export <path>     write all conversations as JSON
/export-md <path>  write the current conversation as Markdown
/load <path>       replace conversations from a JSON export
/clear             empty the current conversation
/history           print the current conversation
/quit              exit";

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Ask(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match (name, arg) {
            ("stream", "on") => Command::Stream(true),
            ("stream", "off") => Command::Stream(false),
            ("chat", name) if !name.is_empty() => Command::Chat(name.to_string()),
            ("export", path) if !path.is_empty() => Command::Export(PathBuf::from(path)),
            ("export-md", path) if !path.is_empty() => Command::ExportMarkdown(PathBuf::from(path)),
            ("load", path) if !path.is_empty() => Command::Load(PathBuf::from(path)),
            ("clear", "") => Command::Clear,
            ("history", "") => Command::History,
            ("help", "") => Command::Help,
            ("quit", "") | ("exit", "") => Command::Quit,
            _ => Command::Invalid(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_query() {
        assert_eq!(
            Command::parse("  what is rust? "),
            Command::Ask("what is rust?".to_string())
        );
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(Command::parse("/stream on"), Command::Stream(true));
        assert_eq!(Command::parse("/stream off"), Command::Stream(false));
        assert_eq!(Command::parse("/chat chat1"), Command::Chat("chat1".to_string()));
        assert_eq!(
            Command::parse("/export out.json"),
            Command::Export(PathBuf::from("out.json"))
        );
        assert_eq!(
            Command::parse("/export-md out.md"),
            Command::ExportMarkdown(PathBuf::from("out.md"))
        );
        assert_eq!(Command::parse("/quit"), Command::Quit);
    }

    #[test]
    fn test_bad_commands_are_invalid() {
        assert!(matches!(Command::parse("/stream maybe"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/chat"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/frobnicate"), Command::Invalid(_)));
    }
}
