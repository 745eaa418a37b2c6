use anyhow::Context;
use clap::{Parser, Subcommand};
use ollama_client::OllamaClient;
use promptflow::backend::GenerationOptions;
use promptflow::config::Config;
use promptflow::pipeline::Bindings;
use promptflow::retrieval::{Document, OllamaEmbedder, RetrievalQa, TextSplitter, VectorIndex, STUFF_PROMPT};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "promptflow",
    about = "Run multi-step prompt pipelines against a local Ollama server"
)]
struct Cli {
    /// TOML config file; built-in defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run a configured pipeline
    Run {
        pipeline: String,
        /// Initial binding, repeatable: --var topic="a lost robot"
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
        /// Print outputs as JSON
        #[arg(long)]
        json: bool,
        /// Also print memory transcripts
        #[arg(long)]
        show_memory: bool,
    },
    /// Build every configured pipeline and report the first problem
    Check,
    /// Answer a question from plain-text documents
    Ask {
        #[arg(short, long = "doc", required = true)]
        docs: Vec<PathBuf>,
        question: String,
        /// Number of chunks to retrieve (overrides [retrieval] top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        #[arg(long)]
        json: bool,
    },
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.trim().is_empty() {
        return Err(format!("empty variable name in '{}'", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Ok(Config::from_file(path)?),
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    promptflow::logging::init(&config.logging, &config.app.log_level)?;
    tracing::debug!("Starting '{}'", config.app.id);

    match cli.cmd {
        Cmd::Run {
            pipeline,
            vars,
            json,
            show_memory,
        } => {
            let definition = config.build_pipeline(&pipeline)?;
            let mut bindings = Bindings::new();
            for (key, value) in vars {
                if let Err(key) = bindings.insert(key, value) {
                    anyhow::bail!("variable '{}' given more than once", key);
                }
            }

            let executor = promptflow::ollama_executor(&config)?;
            let output = executor
                .run(&definition, bindings)
                .await
                .with_context(|| format!("pipeline '{}' failed", pipeline))?;

            if json {
                let value = if show_memory {
                    serde_json::to_value(&output)?
                } else {
                    serde_json::to_value(&output.outputs)?
                };
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                for (key, value) in output.outputs.iter() {
                    println!("== {} ==\n{}\n", key, value);
                }
                if show_memory {
                    for key in output.transcripts.keys() {
                        println!("== memory: {} ==\n{}\n", key, output.transcripts.buffer(key));
                    }
                }
            }
            Ok(())
        }
        Cmd::Check => {
            let pipelines = config.build_pipelines()?;
            for (name, pipeline) in &pipelines {
                println!(
                    "{}: {} ({} step(s), inputs [{}], outputs [{}])",
                    name,
                    pipeline.description(),
                    pipeline.steps().len(),
                    pipeline.declared_inputs().join(", "),
                    pipeline.declared_outputs().join(", ")
                );
            }
            eprintln!("{} pipeline(s) OK", pipelines.len());
            Ok(())
        }
        Cmd::Ask {
            docs,
            question,
            top_k,
            json,
        } => {
            let mut documents = Vec::new();
            for path in &docs {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read document '{}'", path.display()))?;
                documents.extend(Document::from_pages(&path.display().to_string(), &text));
            }
            let chunks = TextSplitter::from_config(&config.retrieval).split_documents(&documents);
            tracing::info!("Indexing {} chunks from {} file(s)", chunks.len(), docs.len());

            let embedder = OllamaEmbedder::new(OllamaClient::new(config.backend.clone())?);
            tracing::debug!("Embedding with '{}'", embedder.model());
            let index = VectorIndex::build(&embedder, chunks).await?;

            let options = GenerationOptions {
                temperature: config.retrieval.temperature,
                ..Default::default()
            };
            let qa = RetrievalQa::with_prompt(
                STUFF_PROMPT,
                top_k.unwrap_or(config.retrieval.top_k),
                options,
            )?;
            let executor = promptflow::ollama_executor(&config)?;
            let answer = qa.ask(&executor, &index, &embedder, &question).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}\n", answer.answer.trim());
                println!("Sources:");
                for hit in &answer.sources {
                    println!(
                        "  - {} (page {}, score {:.3})",
                        hit.document.source().unwrap_or("?"),
                        hit.document.page().unwrap_or("?"),
                        hit.score
                    );
                }
            }
            Ok(())
        }
    }
}
