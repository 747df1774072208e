//! LRC lyric file parsing.
//!
//! Every line is split into its leading bracketed tags and the text after
//! them. Time tags (`[mm:ss.xx]`, `[mm:ss:xx]`, `[mm:ss]`) make a timed line,
//! one per tag; `[key:value]` tags fill [`LrcMetadata`]. Enhanced LRC word
//! timing (`<mm:ss.xx> word`) is kept when present.

use crate::error::{CoreError, Result};
use crate::time::apply_offset;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct LrcFile {
    pub metadata: LrcMetadata,
    /// Timed lines in start order
    pub lines: Vec<LrcLine>,
}

/// ID tags of an LRC file
#[derive(Debug, Clone, Default)]
pub struct LrcMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub length: Option<Duration>,
    /// Milliseconds added to every timestamp; may be negative
    pub offset: i64,
}

impl LrcMetadata {
    fn set_tag(&mut self, key: &str, value: &str) {
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "ti" => self.title = Some(value.to_string()),
            "ar" => self.artist = Some(value.to_string()),
            "al" => self.album = Some(value.to_string()),
            "length" => self.length = parse_timestamp(value),
            "offset" => self.offset = value.parse().unwrap_or(self.offset),
            _ => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct LrcLine {
    pub start_time: Duration,
    pub text: String,
    /// Per-word timing, for enhanced LRC only
    pub words: Option<Vec<LrcWord>>,
}

#[derive(Debug, Clone)]
pub struct LrcWord {
    pub start_time: Duration,
    /// Start of the following time tag, if there is one
    pub end_time: Option<Duration>,
    pub text: String,
}

/// What a single bracketed tag turned out to be
enum Tag<'a> {
    Time(Duration),
    Id(&'a str, &'a str),
    Unknown,
}

impl<'a> Tag<'a> {
    fn classify(content: &'a str) -> Self {
        if let Some(time) = parse_timestamp(content) {
            return Self::Time(time);
        }
        match content.split_once(':') {
            // Digits before the colon means a malformed time tag, not an ID tag
            Some((key, value)) if !key.is_empty() && !key.bytes().all(|b| b.is_ascii_digit()) => {
                Self::Id(key, value)
            }
            _ => Self::Unknown,
        }
    }
}

impl LrcFile {
    /// Parse LRC text.
    ///
    /// Lines come out sorted by start time, with lines that share a start time
    /// kept in file order. Lines whose tags are all malformed are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LrcParseError`] for plain lyrics: text without a
    /// single time tag anywhere in the input.
    pub fn parse(input: &str) -> Result<Self> {
        let mut metadata = LrcMetadata::default();
        let mut lines = Vec::new();
        let mut untagged = 0usize;

        for raw in input.lines() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let (tags, rest) = leading_tags(raw);
            if tags.is_empty() {
                untagged += 1;
                continue;
            }

            let mut starts = Vec::new();
            for tag in tags {
                match Tag::classify(tag) {
                    Tag::Time(time) => starts.push(time),
                    Tag::Id(key, value) => metadata.set_tag(key, value),
                    Tag::Unknown => {}
                }
            }
            if starts.is_empty() {
                continue;
            }

            let words = word_timings(rest);
            let text = words.as_ref().map_or_else(
                || rest.trim().to_string(),
                |words| {
                    words
                        .iter()
                        .map(|w| w.text.as_str())
                        .collect::<Vec<_>>()
                        .join(" ")
                },
            );
            lines.extend(starts.into_iter().map(|start_time| LrcLine {
                start_time,
                text: text.clone(),
                words: words.clone(),
            }));
        }

        if lines.is_empty() && untagged > 0 {
            return Err(CoreError::LrcParseError {
                reason: format!("{untagged} line(s) of text but no timestamps"),
            });
        }

        let offset = metadata.offset;
        if offset != 0 {
            for line in &mut lines {
                line.start_time = apply_offset(line.start_time, offset);
                for word in line.words.iter_mut().flatten() {
                    word.start_time = apply_offset(word.start_time, offset);
                    word.end_time = word.end_time.map(|t| apply_offset(t, offset));
                }
            }
        }

        lines.sort_by_key(|line| line.start_time);

        Ok(Self { metadata, lines })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Split `[a][b]rest` into `["a", "b"]` and `"rest"`.
fn leading_tags(line: &str) -> (Vec<&str>, &str) {
    let mut tags = Vec::new();
    let mut rest = line;
    while let Some(inner) = rest.strip_prefix('[') {
        let Some((tag, after)) = inner.split_once(']') else {
            break;
        };
        tags.push(tag);
        rest = after;
    }
    (tags, rest)
}

/// `mm:ss.xx`, `mm:ss:xx` or `mm:ss`, with one to three fraction digits.
fn parse_timestamp(s: &str) -> Option<Duration> {
    let (minutes, rest) = s.trim().split_once(':')?;
    let (seconds, fraction) = match rest.split_once(|c| c == '.' || c == ':') {
        Some((seconds, fraction)) => (seconds, Some(fraction)),
        None => (rest, None),
    };

    let minutes = parse_digits(minutes)?;
    let seconds = parse_digits(seconds)?;
    if seconds >= 60 {
        return None;
    }
    let millis = match fraction {
        Some(fraction) => fraction_millis(fraction)?,
        None => 0,
    };

    minutes
        .checked_mul(60_000)?
        .checked_add(seconds * 1000 + millis)
        .map(Duration::from_millis)
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// `5` is 500ms, `34` is 340ms, `345` is 345ms; digits past the third are dropped.
fn fraction_millis(digits: &str) -> Option<u64> {
    let digits = digits.get(..3).unwrap_or(digits);
    let value = parse_digits(digits)?;
    Some(match digits.len() {
        1 => value * 100,
        2 => value * 10,
        _ => value,
    })
}

/// Word timing from `<mm:ss.xx> word <mm:ss.xx> word ...`. Text before the
/// first time tag is ignored.
fn word_timings(text: &str) -> Option<Vec<LrcWord>> {
    let mut words: Vec<LrcWord> = Vec::new();

    for chunk in text.split('<').skip(1) {
        let Some((stamp, word)) = chunk.split_once('>') else {
            continue;
        };
        let Some(start_time) = parse_timestamp(stamp) else {
            continue;
        };

        if let Some(previous) = words.last_mut() {
            previous.end_time.get_or_insert(start_time);
        }
        let word = word.trim();
        if !word.is_empty() {
            words.push(LrcWord {
                start_time,
                end_time: None,
                text: word.to_string(),
            });
        }
    }

    (!words.is_empty()).then_some(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(file: &LrcFile) -> Vec<u64> {
        file.lines
            .iter()
            .map(|l| u64::try_from(l.start_time.as_millis()).unwrap())
            .collect()
    }

    #[test]
    fn test_single_line() {
        let file = LrcFile::parse("[01:02.50]Across the water").unwrap();
        assert_eq!(starts(&file), vec![62_500]);
        assert_eq!(file.lines[0].text, "Across the water");
        assert!(file.lines[0].words.is_none());
    }

    #[test]
    fn test_out_of_order_lines_are_sorted() {
        let file = LrcFile::parse(
            "[00:20.00]the light\n[00:02.00]Morning comes\n[00:11.00]and with it\n",
        )
        .unwrap();
        let texts: Vec<_> = file.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Morning comes", "and with it", "the light"]);
    }

    #[test]
    fn test_equal_start_times_keep_file_order() {
        let file = LrcFile::parse("[00:03.00]b\n[00:01.00]first\n[00:03.00]c\n").unwrap();
        let texts: Vec<_> = file.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "b", "c"]);
    }

    #[test]
    fn test_metadata_tags() {
        let input = "[ti:Harbour Lights]\n[ar:The Quay]\n[al:Low Tide]\n[length:04:05]\n[by:someone]\n[00:01.00]la";
        let file = LrcFile::parse(input).unwrap();
        assert_eq!(file.metadata.title.as_deref(), Some("Harbour Lights"));
        assert_eq!(file.metadata.artist.as_deref(), Some("The Quay"));
        assert_eq!(file.metadata.album.as_deref(), Some("Low Tide"));
        assert_eq!(file.metadata.length, Some(Duration::from_secs(245)));
        assert_eq!(file.lines.len(), 1);
    }

    #[test]
    fn test_offset_shifts_lines_and_words() {
        let later = LrcFile::parse("[offset:250]\n[00:04.00]<00:04.00> hey <00:04.50>").unwrap();
        assert_eq!(starts(&later), vec![4_250]);
        let words = later.lines[0].words.as_ref().unwrap();
        assert_eq!(words[0].end_time, Some(Duration::from_millis(4_750)));

        let earlier = LrcFile::parse("[offset:-1500]\n[00:01.00]early").unwrap();
        assert_eq!(starts(&earlier), vec![0]);
    }

    #[test]
    fn test_repeated_line_tags() {
        let file = LrcFile::parse("[00:30.00][00:10.00]Chorus again").unwrap();
        assert_eq!(starts(&file), vec![10_000, 30_000]);
        assert!(file.lines.iter().all(|l| l.text == "Chorus again"));
    }

    #[test]
    fn test_timestamp_variants() {
        assert_eq!(parse_timestamp("00:07:25"), Some(Duration::from_millis(7_250)));
        assert_eq!(parse_timestamp("02:00"), Some(Duration::from_secs(120)));
        assert_eq!(parse_timestamp("00:00.007"), Some(Duration::from_millis(7)));
        assert_eq!(parse_timestamp("00:01.5"), Some(Duration::from_millis(1_500)));
        assert_eq!(parse_timestamp("00:75.00"), None);
        assert_eq!(parse_timestamp("ti:Title"), None);
    }

    #[test]
    fn test_malformed_time_tag_skips_line() {
        let file = LrcFile::parse("[00:99.00]bad\n[00:01.00]good").unwrap();
        let texts: Vec<_> = file.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["good"]);
    }

    #[test]
    fn test_word_timing() {
        let file =
            LrcFile::parse("[00:08.00]<00:08.00> Slow <00:08.60> and <00:09.10> steady <00:10.00>")
                .unwrap();
        let words = file.lines[0].words.as_ref().unwrap();
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["Slow", "and", "steady"]);
        assert_eq!(words[0].end_time, Some(Duration::from_millis(8_600)));
        assert_eq!(words[2].end_time, Some(Duration::from_secs(10)));
        assert_eq!(file.lines[0].text, "Slow and steady");
    }

    #[test]
    fn test_blank_input() {
        assert!(LrcFile::parse("\n  \n").unwrap().is_empty());
    }

    #[test]
    fn test_plain_lyrics_rejected() {
        let result = LrcFile::parse("no timing here\nnor here");
        assert!(matches!(result, Err(CoreError::LrcParseError { .. })));
    }

    #[test]
    fn test_empty_timed_line_is_kept() {
        // Instrumental breaks are written as timed lines without text
        let file = LrcFile::parse("[00:01.00]Intro\n[00:05.00]\n[00:09.00]Verse").unwrap();
        assert_eq!(file.lines.len(), 3);
        assert_eq!(file.lines[1].text, "");
    }
}
