use ragline::cli::{Cli, Commands, ConfigAction};
use ragline::config::Config;
use ragline::embedding::FastEmbedProvider;
use ragline::engine::{ChatEngine, EngineConfig};
use ragline::error::{RaglineError, Result};
use ragline::index::{build_and_persist, VectorIndex};
use ragline::llm::GeminiModel;
use ragline::memory::ConversationMemory;
use ragline::retrieval::Retriever;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Index { corpus, force } => {
            cmd_index(cli.config, corpus, force)?;
        }
        Commands::Ask {
            question,
            session,
            json,
        } => {
            cmd_ask(cli.config, &question, session, json)?;
        }
        Commands::Chat { session } => {
            cmd_chat(cli.config, session)?;
        }
        Commands::History { session_id, json } => {
            cmd_history(cli.config, &session_id, json)?;
        }
        Commands::Status => {
            cmd_status(cli.config)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ragline=info"));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_index(
    config_path: Option<PathBuf>,
    corpus_override: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let corpus_dir = corpus_override.unwrap_or_else(|| config.corpus.path.clone());
    let corpus_dir = expand_path(&corpus_dir)?;
    let index_path = expand_path(&config.storage.index_path())?;

    let provider = FastEmbedProvider::new(&config.embedding.model)?;

    if index_path.exists() && !force {
        // Mirror of the cold-start check: skip rebuild when a valid snapshot
        // for this embedder already exists
        match VectorIndex::load(&index_path, &provider) {
            Ok(index) => {
                println!(
                    "Index already exists at {} ({} documents). Use --force to rebuild.",
                    index_path.display(),
                    index.len()
                );
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Existing snapshot unusable ({}), rebuilding", e);
            }
        }
    }

    println!("Indexing corpus at {}...", corpus_dir.display());
    let index = build_and_persist(
        &corpus_dir,
        &provider,
        &index_path,
        config.embedding.batch_size,
    )?;

    println!(
        "✓ Indexed {} documents ({}D, {}) -> {}",
        index.len(),
        index.dimension(),
        index.model_name(),
        index_path.display()
    );

    Ok(())
}

fn build_engine(config: &Config) -> Result<ChatEngine> {
    let index_path = expand_path(&config.storage.index_path())?;
    let chat_db = expand_path(&config.storage.chat_db_path())?;

    let embedder = Arc::new(FastEmbedProvider::new(&config.embedding.model)?);
    let index = Arc::new(VectorIndex::load(&index_path, embedder.as_ref())?);
    let retriever = Retriever::new(index, config.retrieval.lambda);
    let memory = Arc::new(ConversationMemory::open(&chat_db)?);
    let model = Arc::new(GeminiModel::from_env(
        &config.llm.api_key_env,
        config.llm.model.clone(),
        config.llm.temperature,
    )?);

    let engine_config = EngineConfig {
        k: config.retrieval.k,
        fetch_k: config.retrieval.fetch_k,
        generation_timeout: Duration::from_secs(config.llm.timeout_secs),
        ..EngineConfig::default()
    };

    Ok(ChatEngine::new(
        embedder,
        retriever,
        memory,
        model,
        engine_config,
    ))
}

fn cmd_ask(
    config_path: Option<PathBuf>,
    question: &str,
    session: Option<String>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = build_engine(&config)?;

    let rt = tokio_runtime()?;
    let reply = rt.block_on(engine.chat(session, question))?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "session_id": reply.session_id,
                "response": reply.response,
                "sources": reply.sources,
            })
        );
    } else {
        println!("{}", reply.response);
        if !reply.sources.is_empty() {
            println!("\nSources: {}", reply.sources.join(", "));
        }
        println!("Session: {}", reply.session_id);
    }

    Ok(())
}

fn cmd_chat(config_path: Option<PathBuf>, session: Option<String>) -> Result<()> {
    use std::io::{BufRead, Write};

    let config = load_config(config_path)?;
    let engine = build_engine(&config)?;
    let rt = tokio_runtime()?;

    let mut session_id = session;
    let stdin = std::io::stdin();

    println!("ragline chat (type 'exit' to quit)");
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message == "exit" || message == "quit" {
            break;
        }

        match rt.block_on(engine.chat(session_id.clone(), message)) {
            Ok(reply) => {
                session_id = Some(reply.session_id.clone());
                println!("{}", reply.response);
                if !reply.sources.is_empty() {
                    println!("[sources: {}]", reply.sources.join(", "));
                }
            }
            Err(RaglineError::GenerationUnavailable(msg)) => {
                // Surfaced as an explicit failure, never shown as an answer
                eprintln!("Could not generate a response: {}", msg);
            }
            Err(e) => return Err(e),
        }
    }

    if let Some(id) = session_id {
        println!("Session: {}", id);
    }

    Ok(())
}

fn cmd_history(config_path: Option<PathBuf>, session_id: &str, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let chat_db = expand_path(&config.storage.chat_db_path())?;
    let memory = ConversationMemory::open(&chat_db)?;

    let turns = memory.history(session_id)?;

    if json {
        let out = serde_json::to_string_pretty(&turns).map_err(|e| RaglineError::Json {
            source: e,
            context: "Failed to serialize history".to_string(),
        })?;
        println!("{}", out);
    } else if turns.is_empty() {
        println!("No history for session {}", session_id);
    } else {
        for turn in &turns {
            println!(
                "[{}]\nUser: {}\nBot: {}\n",
                turn.timestamp.format("%Y-%m-%d %H:%M:%S"),
                turn.user_message,
                turn.bot_response
            );
        }
    }

    Ok(())
}

fn cmd_status(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let index_path = expand_path(&config.storage.index_path())?;
    let chat_db = expand_path(&config.storage.chat_db_path())?;

    println!("Ragline Status");
    println!("==============");

    if index_path.exists() {
        println!("\nIndex: present at {}", index_path.display());
    } else {
        println!("\nIndex: not built (run 'ragline index')");
    }

    if chat_db.exists() {
        let memory = ConversationMemory::open(&chat_db)?;
        let stats = memory.stats()?;
        println!(
            "Conversations: {} sessions, {} turns",
            stats.session_count, stats.turn_count
        );
    } else {
        println!("Conversations: none recorded yet");
    }

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| RaglineError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file {
                Some(f) => f,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = Config::default_path()?;

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| RaglineError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(p) => p,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'ragline config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        return Ok(config);
    }

    Config::load(&path)
}

fn tokio_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| RaglineError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| RaglineError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| RaglineError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
