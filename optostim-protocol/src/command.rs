//! Host commands

use optostim_core::{Clock, EventRecorder, LedOutput, SequenceError, Stimulator};

/// Command parsing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Well-formed but not a known command letter
    Unknown,
    /// Not a letter, or a letter followed by something other than `:<arg>`
    Malformed,
    /// Argument missing, unexpected or not a number
    InvalidArgument,
    /// Line exceeded the input buffer
    LineTooLong,
}

impl CommandError {
    /// Human-readable diagnostic
    pub const fn message(&self) -> &'static str {
        match self {
            CommandError::Unknown => "unrecognized command",
            CommandError::Malformed => "unexpected input",
            CommandError::InvalidArgument => "invalid argument",
            CommandError::LineTooLong => "line too long",
        }
    }
}

/// Commands accepted over the serial link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `S`: run the experiment from the first block
    Start,
    /// `X`: stop and switch everything off
    Stop,
    /// `M`: manual mode
    Manual,
    /// `O`: all LEDs on
    AllOn,
    /// `F`: all LEDs off
    AllOff,
    /// `N`: skip to the next block
    NextBlock,
    /// `B:<n>`: start block n
    StartBlock(usize),
}

impl Command {
    /// Parse one trimmed input line
    ///
    /// Letters are case-insensitive.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (head, arg) = match line.split_once(':') {
            Some((head, arg)) => (head, Some(arg.trim())),
            None => (line, None),
        };

        let mut chars = head.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
            _ => return Err(CommandError::Malformed),
        };

        let command = match letter {
            'S' => Command::Start,
            'X' => Command::Stop,
            'M' => Command::Manual,
            'O' => Command::AllOn,
            'F' => Command::AllOff,
            'N' => Command::NextBlock,
            'B' => {
                let index = arg
                    .and_then(|a| a.parse::<usize>().ok())
                    .ok_or(CommandError::InvalidArgument)?;
                return Ok(Command::StartBlock(index));
            }
            _ => return Err(CommandError::Unknown),
        };

        // Only `B` takes an argument
        if arg.is_some() {
            return Err(CommandError::InvalidArgument);
        }
        Ok(command)
    }

    /// Run the command against a stimulator
    pub fn apply<C, O, R, const N: usize>(
        self,
        stimulator: &mut Stimulator<C, O, R, N>,
    ) -> Result<(), SequenceError>
    where
        C: Clock,
        O: LedOutput,
        R: EventRecorder,
    {
        match self {
            Command::Start => stimulator.run_stimulation(),
            Command::Stop => stimulator.stop_stimulation(),
            Command::Manual => stimulator.enter_manual_mode()?,
            Command::AllOn => stimulator.all_on()?,
            Command::AllOff => stimulator.all_off()?,
            Command::NextBlock => stimulator.start_next_block(),
            Command::StartBlock(index) => stimulator.start_block(index)?,
        }
        Ok(())
    }
}
