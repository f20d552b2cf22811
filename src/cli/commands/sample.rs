//! Sample command: decode N draws around one sentence's encoding.

use std::path::PathBuf;

use super::{infer_context, read_sentences, write_sentences};
use crate::cli::logging::{log, warn, LogLevel};
use crate::config::SampleArgs;
use crate::latent::LatentOps;

pub fn run_sample(args: SampleArgs, level: LogLevel) -> crate::Result<()> {
    let (table, source_vocab, target_vocab, mut model) = infer_context(&args.infer)?;
    let mut ops = LatentOps::new(&mut model, &table, &source_vocab, &target_vocab);

    let sentences = read_sentences(&args.infer.input_file)?;
    if sentences.len() > 1 {
        warn(level, &format!("input has {} lines; sampling from the first", sentences.len()));
    }
    let sentence = sentences.first().map(String::as_str).unwrap_or_default();
    let outputs = ops.sample(sentence, args.num_samples)?;

    let out_path = PathBuf::from(format!("{}.{}_sample.txt", args.infer.run, args.num_samples));
    write_sentences(&out_path, &outputs)?;
    log(
        level,
        LogLevel::Normal,
        &format!("wrote {} samples to {}", outputs.len(), out_path.display()),
    );
    Ok(())
}
