use std::{io::Write, process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::Parser;
use common::{
    storage::shared::{SharedStore, StoreConfig},
    utils::{
        config::get_config,
        embedding::{EmbeddingBackend, EmbeddingProvider},
    },
};
use retrieval_pipeline::{answer_question, ChatTurn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Chat with the ingested document collection.
#[derive(Debug, Parser)]
#[command(name = "chat")]
struct ChatArgs {
    /// Embed queries through the OpenAI API instead of the local embedding
    /// service. Must match the backend the documents were ingested with.
    #[arg(long)]
    openai: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let args = match ChatArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let is_help = matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            );
            let _ = err.print();
            return if is_help {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, "chat session failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: ChatArgs) -> anyhow::Result<()> {
    let config = get_config().context("loading configuration")?;

    let backend = if args.openai {
        EmbeddingBackend::OpenAI
    } else {
        EmbeddingBackend::Remote
    };
    let provider = Arc::new(EmbeddingProvider::from_config(&config, backend)?);

    let shared = SharedStore::new(
        StoreConfig {
            base_url: config.vector_store_url.clone(),
            collection_name: config.collection_name.clone(),
            metadata: None,
        },
        Arc::clone(&provider),
    );
    // Bind eagerly so a misconfigured store fails before the first question.
    let store = shared.get().await?;
    info!(collection = store.collection_name(), "connected to collection");

    let api_key = config.require_openai_key()?;
    let openai_client = async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.openai_base_url),
    );

    println!("Ask a question about your documents. Type 'exit' to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut history: Vec<ChatTurn> = Vec::new();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") {
            break;
        }

        match answer_question(
            &openai_client,
            &config.chat_model,
            &store,
            &history,
            question,
            config.retrieval_top_k,
        )
        .await
        {
            Ok(answer) => {
                println!("{answer}\n");
                history.push(ChatTurn {
                    question: question.to_owned(),
                    answer,
                });
            }
            Err(err) => error!(error = %err, "failed to answer question"),
        }
    }

    Ok(())
}
