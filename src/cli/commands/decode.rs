//! Decode command: greedy-decode each input sentence through the latent
//! space, one output line per input line.

use std::path::PathBuf;

use super::{infer_context, read_sentences, write_sentences};
use crate::cli::logging::{log, LogLevel};
use crate::config::InferArgs;
use crate::latent::LatentOps;

pub fn run_decode(args: InferArgs, level: LogLevel) -> crate::Result<()> {
    let (table, source_vocab, target_vocab, mut model) = infer_context(&args)?;
    let mut ops = LatentOps::new(&mut model, &table, &source_vocab, &target_vocab);

    let sentences = read_sentences(&args.input_file)?;
    let mut outputs = Vec::with_capacity(sentences.len());
    for sentence in &sentences {
        outputs.push(ops.autoencode(sentence)?);
    }

    let out_path = PathBuf::from(format!("{}.output.txt", args.run));
    write_sentences(&out_path, &outputs)?;
    log(
        level,
        LogLevel::Normal,
        &format!("wrote {} decoded sentences to {}", outputs.len(), out_path.display()),
    );
    Ok(())
}
