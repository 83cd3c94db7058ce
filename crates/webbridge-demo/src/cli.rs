use clap::Parser;

/// Drive a web bridge session against a recording engine and print what
/// the engine was asked to do.
#[derive(Parser, Debug)]
#[command(name = "webbridge-demo", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// In-page bridge object name override.
    #[arg(long)]
    pub bridge_name: Option<String>,

    /// URL to load once the session is attached. `https://` is assumed
    /// when no scheme is given.
    pub url: Option<String>,

    /// Raw page message to post after loading; may be repeated.
    #[arg(short = 'm', long = "message")]
    pub messages: Vec<String>,

    /// Install the demo request interceptor.
    #[arg(long)]
    pub intercept: bool,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_messages_are_collected() {
        let args = Args::parse_from([
            "webbridge-demo",
            "example.com",
            "-m",
            r#"{"methodName":"appInfo"}"#,
            "--message",
            r#"{"methodName":"echo"}"#,
            "--intercept",
        ]);
        assert_eq!(args.url.as_deref(), Some("example.com"));
        assert_eq!(args.messages.len(), 2);
        assert!(args.intercept);
        assert!(args.config.is_none());
    }
}
