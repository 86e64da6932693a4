use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use opdex_core::chunker::{ChunkingConfig, GuideChunker};
use opdex_core::config::{expand_path, Config};
use opdex_core::types::Retrieved;
use opdex_embed::default_embedder;
use opdex_fusion::KnowledgeRetriever;
use opdex_lexical::index::{load_synonyms, LexicalIndexBuilder};
use opdex_lexical::LexicalIndex;
use opdex_semantic::ChunkStore;

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <build|query> [args...]", prog);
        process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "build" => build(&args),
        "query" => query(&args),
        _ => {
            eprintln!("Unknown command: {}", cmd);
            process::exit(1);
        }
    }
}

/// `opdex build <catalog.json> <out_dir> [--synonyms syn.json] [--guide file-or-dir]`
fn build(args: &[String]) -> anyhow::Result<()> {
    let mut positional = Vec::new();
    let mut synonyms_path: Option<String> = None;
    let mut guide_path: Option<String> = None;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--synonyms" => synonyms_path = it.next().cloned(),
            "--guide" => guide_path = it.next().cloned(),
            _ => positional.push(arg.clone()),
        }
    }
    if positional.len() < 2 {
        eprintln!("Usage: opdex build <catalog.json> <out_dir> [--synonyms syn.json] [--guide file-or-dir]");
        process::exit(1);
    }

    let config = Config::load()?;
    let catalog_path = expand_path(&positional[0]);
    let out_dir = expand_path(&positional[1]);

    // parse every input before publishing anything, so a malformed
    // source aborts with previously-published artifacts untouched
    let synonyms = match synonyms_path {
        Some(p) => load_synonyms(&expand_path(&p))?,
        None => HashMap::new(),
    };
    let chunks = match guide_path {
        Some(g) => {
            let chunker = GuideChunker::new(ChunkingConfig {
                chunk_size: config.chunk_size(),
                chunk_overlap: config.chunk_overlap(),
            })?;
            chunker.chunk_source(&expand_path(&g))?
        }
        None => Vec::new(),
    };
    let embedder = default_embedder(config.embed_dim());
    let store = ChunkStore::build(&chunks, embedder.as_ref())?;

    let index = LexicalIndexBuilder::new(&out_dir).build_from_catalog(&catalog_path, &synonyms)?;
    info!(
        records = index.len(),
        vocabulary = index.vocabulary_size(),
        "lexical artifacts published"
    );
    store.save(&out_dir)?;

    println!(
        "Build complete: {} operations, {} guide chunks -> {}",
        index.len(),
        store.len(),
        out_dir.display()
    );
    Ok(())
}

/// `opdex query "<text>" [k] [--index dir]`
fn query(args: &[String]) -> anyhow::Result<()> {
    let mut positional = Vec::new();
    let mut index_dir: Option<String> = None;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--index" => index_dir = it.next().cloned(),
            _ => positional.push(arg.clone()),
        }
    }
    let Some(text) = positional.first().cloned() else {
        eprintln!("Usage: opdex query \"<query>\" [k] [--index dir]");
        process::exit(1);
    };

    let config = Config::load()?;
    let top_k = positional
        .get(1)
        .and_then(|k| k.parse::<usize>().ok())
        .unwrap_or_else(|| config.top_k());
    let index_dir: PathBuf = index_dir
        .map(expand_path)
        .unwrap_or_else(|| config.index_dir());

    let index = LexicalIndex::load(&index_dir)?;
    let store = ChunkStore::load(&index_dir)?;
    let embedder = default_embedder(store.dim());
    let engine = KnowledgeRetriever::from_parts(index, store, embedder);
    let hits = engine.search(&text, top_k)?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (i, hit) in hits.iter().enumerate() {
        match &hit.item {
            Retrieved::Operation(record) => {
                println!("{:2}. [op]    {} {} - {}", i + 1, record.name, record.path, record.summary);
            }
            Retrieved::Passage(chunk) => {
                println!("{:2}. [guide] {}", i + 1, snippet(&chunk.content, 96));
            }
        }
    }
    Ok(())
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flattened: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out: String = flattened.chars().take(max_chars).collect();
    if flattened.chars().count() > max_chars {
        out.push('…');
    }
    out
}
