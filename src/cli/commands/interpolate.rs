//! Interpolate command: decode evenly spaced latent points between two
//! input sentences.

use std::path::PathBuf;

use super::{infer_context, read_sentences, write_sentences};
use crate::cli::logging::{log, LogLevel};
use crate::config::InterpolateArgs;
use crate::latent::LatentOps;

pub fn run_interpolate(args: InterpolateArgs, level: LogLevel) -> crate::Result<()> {
    let (table, source_vocab, target_vocab, mut model) = infer_context(&args.infer)?;
    let mut ops = LatentOps::new(&mut model, &table, &source_vocab, &target_vocab);

    let sentences = read_sentences(&args.infer.input_file)?;
    let outputs = ops.interpolate(&sentences, args.num_pts)?;

    let out_path = PathBuf::from(format!("{}.interpolate.txt", args.infer.run));
    write_sentences(&out_path, &outputs)?;
    log(
        level,
        LogLevel::Normal,
        &format!("wrote {} interpolated sentences to {}", outputs.len(), out_path.display()),
    );
    Ok(())
}
