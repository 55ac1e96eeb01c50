//! # Interactive Session Protocols
//!
//! The line protocols an external process speaks against the generator and
//! the rater. Both are pure functions over `BufRead`/`Write`; the CLI binds
//! them to stdin/stdout.

use std::io::{BufRead, Write};

use rand::Rng;

use crate::{
    errors::CLResult,
    generate::Generator,
    rate::Rater,
    transducer::{ScoringTransducer, SequenceTransducer},
};

/// Drive the interactive generation protocol until the input ends.
///
/// For every input line (a seed phrase, possibly empty): write the seed
/// followed by the generated text, then the elapsed seconds, then a blank
/// line.
pub fn run_generation_session<M, R, I, O>(
    generator: &Generator<M>,
    rng: &mut R,
    input: I,
    mut output: O,
) -> CLResult<()>
where
    M: SequenceTransducer,
    R: Rng,
    I: BufRead,
    O: Write,
{
    for line in input.lines() {
        let seed = line?;
        let generated = generator.generate(&seed, rng)?;

        writeln!(output, "{}{}", seed, generated.text)?;
        writeln!(output, "{} s", generated.elapsed.as_secs_f64())?;
        writeln!(output)?;
        output.flush()?;
    }
    Ok(())
}

/// Drive the interactive rating protocol until the input ends.
///
/// Input lines are concatenated until one ends with a tab sentinel; the
/// accumulated text (sentinel stripped) is rated, then the score, the
/// elapsed seconds, and a blank line are written.
pub fn run_rating_session<M, I, O>(
    rater: &Rater<M>,
    input: I,
    mut output: O,
) -> CLResult<()>
where
    M: ScoringTransducer,
    I: BufRead,
    O: Write,
{
    let mut pending = String::new();

    for line in input.lines() {
        pending.push_str(&line?);

        if pending.ends_with('\t') {
            pending.pop();
            let rated = rater.rate(&pending)?;
            pending.clear();

            writeln!(output, "{}", rated.score)?;
            writeln!(output, "{} s", rated.elapsed.as_secs_f64())?;
            writeln!(output)?;
            output.flush()?;
        }
    }
    Ok(())
}
