//! Runnable playground demo.
//!
//! Uses a toy line-oriented transformer so the full loop is interactive
//! without a real transform engine. Pass `key=value` pairs as arguments to
//! seed the query-string port, e.g.:
//!
//! ```text
//! cargo run --example playground -- presets=es2015,react code='const x = 1;'
//! ```
//!
//! Tab switches between the editor and the options panel; Space toggles the
//! selected option; Ctrl+C quits. Set `RUST_LOG=playground=debug` to see
//! loader/compiler events on stderr.

use std::time::Duration;

use async_trait::async_trait;
use playground::prelude::*;

/// Toy transformer: each preset applies a textual rewrite, prettify strips
/// trailing whitespace, and evaluate fails on a `throw` marker.
struct DemoTransformer;

impl Transformer for DemoTransformer {
    fn transform(&self, source: &str, options: &TransformOptions) -> Result<String, CompileError> {
        if source.contains("syntax!") {
            return Err(CompileError("unexpected token `syntax!`".to_string()));
        }

        let mut out = source.to_string();
        for preset in &options.presets {
            out = match preset.as_str() {
                "babel-preset-es2015" => out.replace("const ", "var ").replace("let ", "var "),
                "babel-preset-react" => out.replace("=>", "function"),
                other => format!("/* {other} */\n{out}"),
            };
        }

        if options.prettify {
            out = out
                .lines()
                .map(str::trim_end)
                .collect::<Vec<_>>()
                .join("\n");
        }

        Ok(out)
    }

    fn evaluate(&self, compiled: &str) -> Result<(), EvalError> {
        if compiled.contains("throw") {
            Err(EvalError("uncaught exception".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Fetcher with artificial latency, so load markers are visible in the UI.
struct SleepyFetcher {
    delay: Duration,
}

#[async_trait]
impl PluginFetcher for SleepyFetcher {
    async fn fetch(&self, config: PluginConfig) -> Result<PluginHandle, LoadError> {
        tokio::time::sleep(self.delay).await;
        Ok(PluginHandle {
            package: config.package.to_string(),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let pairs: Vec<(String, String)> = std::env::args()
        .skip(1)
        .filter_map(|arg| {
            arg.split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
        })
        .collect();

    let (repl, completions) = Repl::builder()
        .transformer(DemoTransformer)
        .fetcher(SleepyFetcher {
            delay: Duration::from_millis(800),
        })
        .store(FileStore::new("playground-session.json"))
        .query(MemoryQuery::with_pairs(&pairs))
        .build()?;

    PlaygroundApp::new(repl, completions).run().await?;
    Ok(())
}
