use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;

pub const USAGE: &str = "Usage: ctxdb <command> [args...]

Commands:
  collections
  create <name> <dimension> [--hybrid]
  drop <name>
  ingest <name> <documents.jsonl> [--batch <n>]
  search <name> <v1,v2,...> [--top-k <n>] [--filter <expr>]
  hybrid <name> [--vector <v1,v2,...>] [--text <query>] [--limit <n>] [--filter <expr>]
  query <name> [--filter <expr>] [--fields <a,b,...>] [--limit <n>]
  delete <name> <id>...
  stats <name> [--filter <expr>]";

pub const DEFAULT_BATCH: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Collections,
    Create { name: String, dimension: usize, hybrid: bool },
    Drop { name: String },
    Ingest { name: String, path: PathBuf, batch: usize },
    Search { name: String, vector: Vec<f32>, top_k: Option<usize>, filter: Option<String> },
    Hybrid { name: String, vector: Option<Vec<f32>>, text: Option<String>, limit: Option<usize>, filter: Option<String> },
    Query { name: String, filter: Option<String>, fields: Vec<String>, limit: Option<usize> },
    Delete { name: String, ids: Vec<String> },
    Stats { name: String, filter: Option<String> },
}

/// Flags with values are pulled out first; what remains is positional.
struct Parsed {
    positional: Vec<String>,
    flags: Vec<(String, Option<String>)>,
}

const SWITCHES: &[&str] = &["--hybrid"];

fn split(args: &[String]) -> Result<Parsed> {
    let mut positional = Vec::new();
    let mut flags = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if !arg.starts_with("--") {
            positional.push(arg.clone());
        } else if SWITCHES.contains(&arg.as_str()) {
            flags.push((arg.clone(), None));
        } else {
            let value = iter.next().ok_or_else(|| anyhow!("{arg} requires a value"))?;
            flags.push((arg.clone(), Some(value.clone())));
        }
    }
    Ok(Parsed { positional, flags })
}

impl Parsed {
    fn flag(&self, name: &str) -> Option<&str> {
        self.flags.iter().rev().find(|(f, _)| f == name).and_then(|(_, v)| v.as_deref())
    }

    fn switch(&self, name: &str) -> bool {
        self.flags.iter().any(|(f, _)| f == name)
    }

    fn number(&self, name: &str) -> Result<Option<usize>> {
        self.flag(name)
            .map(|v| v.parse::<usize>().with_context(|| format!("{name} requires a number, got '{v}'")))
            .transpose()
    }

    fn positional(&self, index: usize, what: &str) -> Result<String> {
        self.positional.get(index).cloned().ok_or_else(|| anyhow!("missing <{what}>\n\n{USAGE}"))
    }

    fn reject_unknown(&self, known: &[&str]) -> Result<()> {
        if let Some((flag, _)) = self.flags.iter().find(|(f, _)| !known.contains(&f.as_str())) {
            bail!("unknown option {flag}\n\n{USAGE}");
        }
        Ok(())
    }
}

pub fn parse_vector(raw: &str) -> Result<Vec<f32>> {
    raw.split(',')
        .map(|v| v.trim().parse::<f32>().with_context(|| format!("invalid vector component '{v}'")))
        .collect()
}

pub fn parse(args: &[String]) -> Result<Command> {
    let (cmd, rest) = args.split_first().ok_or_else(|| anyhow!(USAGE))?;
    let p = split(rest)?;
    let command = match cmd.as_str() {
        "collections" => {
            p.reject_unknown(&[])?;
            Command::Collections
        }
        "create" => {
            p.reject_unknown(&["--hybrid"])?;
            let dimension = p.positional(1, "dimension")?;
            Command::Create {
                name: p.positional(0, "name")?,
                dimension: dimension.parse().with_context(|| format!("invalid dimension '{dimension}'"))?,
                hybrid: p.switch("--hybrid"),
            }
        }
        "drop" => {
            p.reject_unknown(&[])?;
            Command::Drop { name: p.positional(0, "name")? }
        }
        "ingest" => {
            p.reject_unknown(&["--batch"])?;
            Command::Ingest {
                name: p.positional(0, "name")?,
                path: PathBuf::from(p.positional(1, "documents.jsonl")?),
                batch: p.number("--batch")?.filter(|b| *b > 0).unwrap_or(DEFAULT_BATCH),
            }
        }
        "search" => {
            p.reject_unknown(&["--top-k", "--filter"])?;
            Command::Search {
                name: p.positional(0, "name")?,
                vector: parse_vector(&p.positional(1, "vector")?)?,
                top_k: p.number("--top-k")?,
                filter: p.flag("--filter").map(str::to_string),
            }
        }
        "hybrid" => {
            p.reject_unknown(&["--vector", "--text", "--limit", "--filter"])?;
            let command = Command::Hybrid {
                name: p.positional(0, "name")?,
                vector: p.flag("--vector").map(parse_vector).transpose()?,
                text: p.flag("--text").map(str::to_string),
                limit: p.number("--limit")?,
                filter: p.flag("--filter").map(str::to_string),
            };
            if matches!(&command, Command::Hybrid { vector: None, text: None, .. }) {
                bail!("hybrid needs --vector and/or --text");
            }
            command
        }
        "query" => {
            p.reject_unknown(&["--filter", "--fields", "--limit"])?;
            Command::Query {
                name: p.positional(0, "name")?,
                filter: p.flag("--filter").map(str::to_string),
                fields: p
                    .flag("--fields")
                    .map(|f| f.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                    .unwrap_or_default(),
                limit: p.number("--limit")?,
            }
        }
        "delete" => {
            p.reject_unknown(&[])?;
            let name = p.positional(0, "name")?;
            let ids = p.positional[1..].to_vec();
            if ids.is_empty() {
                bail!("delete needs at least one <id>");
            }
            Command::Delete { name, ids }
        }
        "stats" => {
            p.reject_unknown(&["--filter"])?;
            Command::Stats { name: p.positional(0, "name")?, filter: p.flag("--filter").map(str::to_string) }
        }
        other => bail!("unknown command '{other}'\n\n{USAGE}"),
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(s: &[&str]) -> Vec<String> {
        s.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn create_with_hybrid_switch() {
        let cmd = parse(&argv(&["create", "code", "768", "--hybrid"])).expect("parse");
        assert_eq!(cmd, Command::Create { name: "code".into(), dimension: 768, hybrid: true });
        let plain = parse(&argv(&["create", "code", "3"])).expect("parse");
        assert_eq!(plain, Command::Create { name: "code".into(), dimension: 3, hybrid: false });
    }

    #[test]
    fn hybrid_takes_vector_and_text() {
        let cmd = parse(&argv(&["hybrid", "code", "--vector", "0.1, 0.2,0.3", "--text", "hello world", "--limit", "5"]))
            .expect("parse");
        assert_eq!(
            cmd,
            Command::Hybrid {
                name: "code".into(),
                vector: Some(vec![0.1, 0.2, 0.3]),
                text: Some("hello world".into()),
                limit: Some(5),
                filter: None,
            }
        );
        assert!(parse(&argv(&["hybrid", "code"])).is_err());
    }

    #[test]
    fn query_fields_and_ingest_defaults() {
        let cmd = parse(&argv(&["query", "code", "--fields", "id, relativePath", "--filter", "startLine > 3"]))
            .expect("parse");
        assert_eq!(
            cmd,
            Command::Query {
                name: "code".into(),
                filter: Some("startLine > 3".into()),
                fields: vec!["id".into(), "relativePath".into()],
                limit: None,
            }
        );
        let ingest = parse(&argv(&["ingest", "code", "docs.jsonl"])).expect("parse");
        assert_eq!(ingest, Command::Ingest { name: "code".into(), path: "docs.jsonl".into(), batch: DEFAULT_BATCH });
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(parse(&[]).is_err());
        assert!(parse(&argv(&["frobnicate"])).is_err());
        assert!(parse(&argv(&["search", "code", "1,x"])).is_err());
        assert!(parse(&argv(&["search", "code", "1,2", "--top-k"])).is_err());
        assert!(parse(&argv(&["stats", "code", "--verbose", "1"])).is_err());
        assert!(parse(&argv(&["delete", "code"])).is_err());
    }
}
