//! Command line front end: markup ⇄ box tree ⇄ JSON.
use std::path::{Path, PathBuf};
use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use xml_box::{
    DecoderOptions, EncoderOptions, KeyDecodingStrategy, KeyEncodingStrategy, NodeEncoding,
    NodeEncodingStrategy, XmlDecoder, XmlEncoder,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// inspect markup as box trees and convert between markup and JSON
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse markup and print each box tree as JSON
    Inspect(InspectOut),
    /// decode markup into untyped JSON
    ToJson(ToJsonOut),
    /// encode JSON documents as markup
    FromJson(FromJsonOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct InspectOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ToJsonOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// how markup names map onto JSON keys
    #[arg(long, value_enum, default_value_t = KeyDecodingFlag::Default)]
    key_decoding: KeyDecodingFlag,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct FromJsonOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// name of the root element
    #[arg(long, default_value = "root")]
    root: String,

    /// how JSON keys map onto markup names
    #[arg(long, value_enum, default_value_t = KeyEncodingFlag::Default)]
    key_encoding: KeyEncodingFlag,

    /// JSON keys written as attributes, in addition to `@`-prefixed ones
    #[arg(long = "attribute")]
    attributes: Vec<String>,

    /// output markup file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum KeyDecodingFlag {
    Default,
    Snake,
    Kebab,
    Camel,
    Capitalized,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum KeyEncodingFlag {
    Default,
    Snake,
    Kebab,
    Camel,
    Capitalized,
    Upper,
    Lower,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(&Path, String) -> anyhow::Result<()>) -> anyhow::Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            apply(&source_path, source)
                .with_context(|| format!("while processing {}", source_path.display()))?;
        }
        Ok(())
    }
}

impl From<KeyDecodingFlag> for KeyDecodingStrategy {
    fn from(flag: KeyDecodingFlag) -> Self {
        match flag {
            KeyDecodingFlag::Default => KeyDecodingStrategy::UseDefaultKeys,
            KeyDecodingFlag::Snake => KeyDecodingStrategy::ConvertFromSnakeCase,
            KeyDecodingFlag::Kebab => KeyDecodingStrategy::ConvertFromKebabCase,
            KeyDecodingFlag::Camel => KeyDecodingStrategy::ConvertFromCamelCase,
            KeyDecodingFlag::Capitalized => KeyDecodingStrategy::ConvertFromCapitalized,
        }
    }
}

impl From<KeyEncodingFlag> for KeyEncodingStrategy {
    fn from(flag: KeyEncodingFlag) -> Self {
        match flag {
            KeyEncodingFlag::Default => KeyEncodingStrategy::UseDefaultKeys,
            KeyEncodingFlag::Snake => KeyEncodingStrategy::ConvertToSnakeCase,
            KeyEncodingFlag::Kebab => KeyEncodingStrategy::ConvertToKebabCase,
            KeyEncodingFlag::Camel => KeyEncodingStrategy::ConvertToCamelCase,
            KeyEncodingFlag::Capitalized => KeyEncodingStrategy::Capitalized,
            KeyEncodingFlag::Upper => KeyEncodingStrategy::Uppercased,
            KeyEncodingFlag::Lower => KeyEncodingStrategy::Lowercased,
        }
    }
}

impl FromJsonOut {
    fn encoder(&self) -> XmlEncoder {
        let mut options = EncoderOptions::new().key_encoding(self.key_encoding.into());
        if !self.attributes.is_empty() {
            let attributes = self.attributes.clone();
            options = options.node_encoding(NodeEncodingStrategy::custom(move |field| {
                if field.starts_with('@') || attributes.iter().any(|name| name == field) {
                    NodeEncoding::Attribute
                } else {
                    NodeEncoding::Element
                }
            }));
        }
        XmlEncoder::new(options)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Inspect(target) => {
                let mut trees = Vec::new();
                target.input_settings.load_process(|_, source| {
                    trees.push(xml_box::markup::parse_box(&source)?);
                    Ok(())
                })?;
                let json_src = match trees.as_slice() {
                    [tree] => serde_json::to_string_pretty(tree)?,
                    _ => serde_json::to_string_pretty(&trees)?,
                };
                emit(target.out.as_deref(), &json_src)
            }
            Command::ToJson(target) => {
                let decoder = XmlDecoder::new(DecoderOptions::new().key_decoding(target.key_decoding.into()));
                let mut values = Vec::new();
                target.input_settings.load_process(|_, source| {
                    let value = xml_box::path_de::from_str_with_path::<serde_json::Value>(&decoder, &source)
                        .map_err(|message| anyhow!(message))?;
                    values.push(value);
                    Ok(())
                })?;
                let json_src = match values.as_slice() {
                    [value] => serde_json::to_string_pretty(value)?,
                    _ => serde_json::to_string_pretty(&values)?,
                };
                emit(target.out.as_deref(), &json_src)
            }
            Command::FromJson(target) => {
                let encoder = target.encoder();
                let mut documents = Vec::new();
                target.input_settings.load_process(|source_path, source| {
                    let value = serde_json::from_str::<serde_json::Value>(&source)
                        .with_context(|| format!("failed to parse JSON source file {}", source_path.display()))?;
                    documents.push(encoder.encode_to_string(&value, &target.root)?);
                    Ok(())
                })?;
                emit(target.out.as_deref(), &documents.join("\n"))
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn emit(out: Option<&Path>, text: &str) -> anyhow::Result<()> {
    let Some(out) = out else {
        println!("{text}");
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))?;
    tracing::debug!(path = %out.display(), bytes = text.len(), "output written");
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let before = out.len();
            for entry in glob::glob(pattern)? {
                out.push(entry?);
            }
            if out.len() == before {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
