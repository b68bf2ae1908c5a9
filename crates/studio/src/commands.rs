use std::path::PathBuf;

use retouch::{AspectRatio, EditingMode, GenerationParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSize {
    Count(usize),
    /// Use the `batch_size` setting.
    FromSettings,
}

/// A generation line: plain text or one of the generation commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateArgs {
    pub instruction: String,
    /// Overrides the session's active mode for this request.
    pub mode: Option<EditingMode>,
    pub batch: Option<BatchSize>,
    pub force_new: bool,
    pub use_original: bool,
    /// File path or `http(s)` URL.
    pub reference: Option<String>,
    pub mask: Option<PathBuf>,
    pub params: GenerationParams,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Upload(PathBuf),
    Mode(Option<EditingMode>),
    Generate(GenerateArgs),
    Undo,
    Redo,
    Reset,
    /// Reset and delete the saved copy of the session.
    Forget,
    Describe,
    ExtractStyle,
    Refine(String),
    Preview(String),
    Set { key: String, value: String },
    Settings,
    Status,
    Export(PathBuf),
    Dismiss,
    Unknown(String),
    /// A known command with unusable arguments.
    Invalid(String),
}

pub const HELP: &str = "\
commands:
  <instruction>            run the instruction in the active mode
  /mode [name]             show or switch mode (edit, adjust, style, vector, inpaint, generate, video)
  /new <instruction>       generate from scratch, ignoring the timeline
  /original <instruction>  edit the original instead of the active step
  /batch [n] <instruction> generate n variants (default: batch_size setting),
                           guided by --ref or by the active image
  /video <instruction>     generate a video from the active image or from text
  /upload <path>           start over from a local file
  /undo  /redo  /reset     move through or clear the history
  /forget                  clear the history and delete the saved session
  /describe  /style        describe the active image or extract its style
  /refine <text>           rewrite a prompt
  /preview <text>          quick low-cost draft
  /export <path>           write the active artifact to a file
  /set <key> <value>       change a setting; /settings lists them
  /status  /dismiss  /help  /quit
options for generation lines:
  --aspect <ratio> --seed <n> --duration <secs> --fps <n> --motion <0..1>
  --ref <path|url> --mask <path>";

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if !trimmed.starts_with('/') {
        return Some(generate(trimmed, GenerateArgs::default()));
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    let parsed = match command {
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        "/upload" => required(rest, "/upload needs a file path", |rest| {
            Command::Upload(PathBuf::from(rest))
        }),
        "/export" => required(rest, "/export needs a file path", |rest| {
            Command::Export(PathBuf::from(rest))
        }),
        "/mode" if rest.is_empty() => Command::Mode(None),
        "/mode" => match rest.parse::<EditingMode>() {
            Ok(mode) => Command::Mode(Some(mode)),
            Err(error) => Command::Invalid(error.detail().to_string()),
        },
        "/new" => generate(
            rest,
            GenerateArgs {
                force_new: true,
                ..GenerateArgs::default()
            },
        ),
        "/original" => generate(
            rest,
            GenerateArgs {
                use_original: true,
                ..GenerateArgs::default()
            },
        ),
        "/video" => generate(
            rest,
            GenerateArgs {
                mode: Some(EditingMode::Video),
                ..GenerateArgs::default()
            },
        ),
        "/batch" => batch(rest),
        "/undo" => Command::Undo,
        "/redo" => Command::Redo,
        "/reset" => Command::Reset,
        "/forget" => Command::Forget,
        "/describe" => Command::Describe,
        "/style" => Command::ExtractStyle,
        "/refine" => required(rest, "/refine needs a prompt", |rest| {
            Command::Refine(rest.to_string())
        }),
        "/preview" => required(rest, "/preview needs a prompt", |rest| {
            Command::Preview(rest.to_string())
        }),
        "/set" => match rest.split_once(char::is_whitespace) {
            Some((key, value)) => Command::Set {
                key: key.to_string(),
                value: value.trim().to_string(),
            },
            None => Command::Invalid("usage: /set <key> <value>".to_string()),
        },
        "/settings" => Command::Settings,
        "/status" => Command::Status,
        "/dismiss" => Command::Dismiss,
        _ => Command::Unknown(command.to_string()),
    };

    Some(parsed)
}

fn required(rest: &str, message: &str, build: impl FnOnce(&str) -> Command) -> Command {
    if rest.is_empty() {
        Command::Invalid(message.to_string())
    } else {
        build(rest)
    }
}

fn batch(rest: &str) -> Command {
    let (size, rest) = match rest.split_once(char::is_whitespace) {
        Some((first, remainder)) => match first.parse::<usize>() {
            Ok(count) => (BatchSize::Count(count), remainder),
            Err(_) => (BatchSize::FromSettings, rest),
        },
        None => (BatchSize::FromSettings, rest),
    };
    generate(
        rest,
        GenerateArgs {
            batch: Some(size),
            ..GenerateArgs::default()
        },
    )
}

fn generate(text: &str, base: GenerateArgs) -> Command {
    match parse_generate_args(text, base) {
        Ok(args) if args.instruction.is_empty() => {
            Command::Invalid("an instruction is required".to_string())
        }
        Ok(args) => Command::Generate(args),
        Err(message) => Command::Invalid(message),
    }
}

fn parse_generate_args(text: &str, mut args: GenerateArgs) -> Result<GenerateArgs, String> {
    let mut words = Vec::new();
    let mut tokens = text.split_whitespace();

    while let Some(token) = tokens.next() {
        let Some(flag) = token.strip_prefix("--") else {
            words.push(token);
            continue;
        };
        let value = tokens
            .next()
            .ok_or_else(|| format!("--{flag} needs a value"))?;

        match flag {
            "aspect" => {
                let ratio = value
                    .parse::<AspectRatio>()
                    .map_err(|error| error.detail().to_string())?;
                args.params.aspect_ratio = Some(ratio);
            }
            "seed" => args.params.seed = Some(number(flag, value)?),
            "duration" => args.params.duration_secs = Some(number(flag, value)?),
            "fps" => args.params.frame_rate = Some(number(flag, value)?),
            "motion" => {
                let motion: f32 = number(flag, value)?;
                if !(0.0..=1.0).contains(&motion) {
                    return Err("--motion must be between 0 and 1".to_string());
                }
                args.params.motion_strength = Some(motion);
            }
            "ref" => args.reference = Some(value.to_string()),
            "mask" => args.mask = Some(PathBuf::from(value)),
            unknown => return Err(format!("unknown option --{unknown}")),
        }
    }

    args.instruction = words.join(" ");
    Ok(args)
}

fn number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("--{flag} expects a number, got '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_is_a_generation_in_the_active_mode() {
        assert_eq!(
            parse_command("  Golden Hour  "),
            Some(Command::Generate(GenerateArgs {
                instruction: "Golden Hour".to_string(),
                ..GenerateArgs::default()
            }))
        );
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn simple_commands_parse() {
        assert_eq!(parse_command("/undo"), Some(Command::Undo));
        assert_eq!(parse_command("/forget"), Some(Command::Forget));
        assert_eq!(parse_command("/redo"), Some(Command::Redo));
        assert_eq!(parse_command("/exit"), Some(Command::Quit));
        assert_eq!(parse_command("/mode"), Some(Command::Mode(None)));
        assert_eq!(
            parse_command("/mode Style"),
            Some(Command::Mode(Some(EditingMode::Style)))
        );
        assert_eq!(
            parse_command("/upload ./photos/cat.png"),
            Some(Command::Upload(PathBuf::from("./photos/cat.png")))
        );
        assert_eq!(
            parse_command("/set batch_size 6"),
            Some(Command::Set {
                key: "batch_size".to_string(),
                value: "6".to_string()
            })
        );
        assert_eq!(
            parse_command("/wat"),
            Some(Command::Unknown("/wat".to_string()))
        );
    }

    #[test]
    fn generation_flags_fill_params() {
        let Some(Command::Generate(args)) =
            parse_command("/video a slow pan --aspect 9:16 --duration 8 --fps 24 --motion 0.25")
        else {
            panic!("expected a generation");
        };

        assert_eq!(args.instruction, "a slow pan");
        assert_eq!(args.mode, Some(EditingMode::Video));
        assert_eq!(args.params.aspect_ratio, Some(AspectRatio::Portrait9x16));
        assert_eq!(args.params.duration_secs, Some(8));
        assert_eq!(args.params.frame_rate, Some(24));
        assert_eq!(args.params.motion_strength, Some(0.25));
    }

    #[test]
    fn batch_count_is_optional() {
        let Some(Command::Generate(explicit)) = parse_command("/batch 3 red fox") else {
            panic!("expected a generation");
        };
        assert_eq!(explicit.batch, Some(BatchSize::Count(3)));
        assert_eq!(explicit.instruction, "red fox");

        let Some(Command::Generate(default)) = parse_command("/batch red fox") else {
            panic!("expected a generation");
        };
        assert_eq!(default.batch, Some(BatchSize::FromSettings));
        assert_eq!(default.instruction, "red fox");
    }

    #[test]
    fn new_and_original_set_source_flags() {
        let Some(Command::Generate(new)) = parse_command("/new sunset --ref https://x/y.png")
        else {
            panic!("expected a generation");
        };
        assert!(new.force_new);
        assert_eq!(new.reference.as_deref(), Some("https://x/y.png"));

        let Some(Command::Generate(original)) = parse_command("/original warmer") else {
            panic!("expected a generation");
        };
        assert!(original.use_original);
    }

    #[test]
    fn bad_arguments_are_reported() {
        for line in [
            "/upload",
            "/mode sepia",
            "/new",
            "/new --seed",
            "/new sky --seed abc",
            "/new sky --motion 2",
            "/new sky --aspect 5:4",
            "/new sky --color red",
            "/set livePreview",
            "/refine",
        ] {
            assert!(
                matches!(parse_command(line), Some(Command::Invalid(_))),
                "{line}"
            );
        }
    }
}
