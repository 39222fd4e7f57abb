use anyhow::{bail, Context, Result};
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;

use brain2en::{
    build_examples, electrode_matrix, generate_word_pairs, read_transcript, remove_duplicates,
    remove_oovs, write_examples, Brain2enDataset, DataTag, PipelineConfig, Vocabulary,
};

#[derive(Parser)]
#[command(
    name = "prepare",
    about = "Build ECoG-to-text training examples from a transcript and per-electrode recordings"
)]
struct Args {
    /// Delimited transcript file (one utterance per line).
    #[arg(long)]
    transcript: PathBuf,

    /// Field delimiter in the transcript.
    #[arg(long, default_value_t = ',')]
    delim: char,

    /// Conversation directory containing preprocessed/ electrode files.
    #[arg(long)]
    conversation: PathBuf,

    /// Electrode ids: comma-separated values and inclusive ranges (1-64,70).
    #[arg(long, default_value = "1-64")]
    electrodes: String,

    /// Vocabulary JSON file (token -> id).
    #[arg(long)]
    vocab: PathBuf,

    /// Data split: "train" removes every OOV pair, anything else keeps
    /// partially-unknown pairs.
    #[arg(long, default_value = "train")]
    tag: String,

    /// Comma-separated words to strip from transcript text.
    #[arg(long, default_value = "")]
    exclude: String,

    /// Samples added to each pair's onset (negative opens the window early).
    #[arg(long, default_value_t = -512, allow_hyphen_values = true)]
    start_offset: i64,

    /// Samples added to each pair's offset.
    #[arg(long, default_value_t = 512, allow_hyphen_values = true)]
    end_offset: i64,

    /// Samples per bin.
    #[arg(long, default_value_t = 32.0)]
    bin_fs: f64,

    /// Minimum window length in samples.
    #[arg(long, default_value_t = 64)]
    window: i64,

    /// Output safetensors path.
    #[arg(long)]
    output: PathBuf,
}

/// Expand "1-4,7,9-10" into [1, 2, 3, 4, 7, 9, 10].
fn parse_electrodes(spec: &str) -> Result<Vec<u32>> {
    let mut out = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((lo, hi)) => {
                let lo: u32 = lo.trim().parse().context("bad electrode range start")?;
                let hi: u32 = hi.trim().parse().context("bad electrode range end")?;
                if lo > hi {
                    bail!("empty electrode range {part:?}");
                }
                out.extend(lo..=hi);
            }
            None => out.push(part.parse().context("bad electrode id")?),
        }
    }
    if out.is_empty() {
        bail!("no electrodes given");
    }
    Ok(out)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("brain2en=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let vocab = Vocabulary::load(&args.vocab)?;
    println!("Vocabulary: {} tokens", vocab.len());

    let excluded: HashSet<String> = args
        .exclude
        .split(',')
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();

    let utterances = read_transcript(&args.transcript, args.delim, &vocab, &excluded)?;
    println!("Parsed {} utterances", utterances.len());

    let grams = generate_word_pairs(&utterances);
    let grams = remove_duplicates(grams);
    let tag = if args.tag == "train" {
        DataTag::Train
    } else {
        DataTag::Eval
    };
    let grams = remove_oovs(grams, &vocab, tag);
    println!("Kept {} word pairs ({:?})", grams.len(), tag);

    let electrodes = parse_electrodes(&args.electrodes)?;
    let ecogs = electrode_matrix(&args.conversation, &electrodes)?;
    println!(
        "Signal matrix: {} samples × {} electrodes",
        ecogs.nrows(),
        ecogs.ncols()
    );

    let cfg = PipelineConfig {
        start_offset: args.start_offset,
        end_offset: args.end_offset,
        bin_fs: args.bin_fs,
        window: args.window,
        ..PipelineConfig::default()
    };

    let (signals, labels) = build_examples(&grams, &ecogs, &vocab, &cfg)?;
    let dataset = Brain2enDataset::new(signals, labels)?;
    println!(
        "Dataset: {} examples ({} skipped), max segment {} steps, max label {} tokens",
        dataset.len(),
        dataset.skipped,
        dataset.max_seq_len,
        dataset.max_sent_len
    );

    let sigs: Vec<_> = dataset.iter().map(|ex| ex.signal.clone()).collect();
    let labs: Vec<_> = dataset.iter().map(|ex| ex.labels.clone()).collect();
    write_examples(&sigs, &labs, &args.output)?;
    println!("Written → {}", args.output.display());

    Ok(())
}
