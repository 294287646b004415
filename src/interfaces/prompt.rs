use crate::domain::channel::ChannelId;
use crate::domain::payout::Payout;
use crate::domain::ports::{ConfirmationGate, Decision};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::io::{self, BufRead, Write};

/// Prompts until a valid `YYYY-MM-DD` date is entered. When `after` is
/// given, the date must be strictly later; otherwise the prompt repeats.
pub fn read_date(prompt: &str, after: Option<NaiveDate>) -> io::Result<NaiveDate> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("{prompt}");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }

        match NaiveDate::parse_from_str(line.trim(), "%Y-%m-%d") {
            Ok(date) => {
                if let Some(start) = after
                    && date <= start
                {
                    println!("End date must be after start date.");
                    continue;
                }
                return Ok(date);
            }
            Err(e) => println!("{e}"),
        }
    }
}

/// Interactive y/n gate over stdin; anything else re-prompts. Declining
/// cancels the whole run.
pub struct StdinGate;

#[async_trait]
impl ConfirmationGate for StdinGate {
    async fn confirm(&self, payout: &Payout, channel: ChannelId) -> Result<Decision> {
        let question = format!(
            "Attempt to send payout of {} through channel {}? \
             Enter y to continue or n to exit program: ",
            payout.amount, channel
        );
        // Blocking stdin read; the run is strictly sequential so nothing
        // else is in flight while we wait.
        tokio::task::spawn_blocking(move || prompt_yes_no(&question))
            .await
            .map_err(|e| PayoutError::Io(io::Error::other(e)))?
    }
}

fn prompt_yes_no(question: &str) -> Result<Decision> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("{question}");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Err(PayoutError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed",
            )));
        }

        match line.trim().to_lowercase().as_str() {
            "y" => return Ok(Decision::Approved),
            "n" => return Ok(Decision::Declined),
            _ => println!("Invalid input. Please enter either 'y' or 'n'."),
        }
    }
}
