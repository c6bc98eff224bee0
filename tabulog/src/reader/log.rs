//! E-Prime log reader.
//!
//! A log starts with a header block, followed by log frames. Each frame is
//! announced by a `Level: N` line and holds `Key: Value` pairs. Frames are
//! written when they close, so children come before their parent: a frame
//! at level L adopts every earlier frame with a deeper level that has no
//! parent yet. Frames without children become rows.
//!
//! ```text
//! *** Header Start ***
//! LevelName: Session
//! LevelName: Block
//! Experiment: stroop
//! *** Header End ***
//! Level: 2
//! *** LogFrame Start ***
//!     Procedure: TrialProc
//! *** LogFrame End ***
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

use super::detect::HEADER_START;
use crate::data::DataSet;
use crate::error::{ReadError, ReadResult};

const HEADER_END: &str = "*** Header End ***";
const FRAME_START: &str = "*** LogFrame Start ***";
const FRAME_END: &str = "*** LogFrame End ***";

static LEVEL_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Level:\s*(\S*)$").expect("level pattern is valid"));
static KEY_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^:]+?)\s*:\s?(.*)$").expect("key/value pattern is valid"));

#[derive(Debug)]
struct Frame {
    level: usize,
    fields: Vec<(String, String)>,
    parent: Option<usize>,
    has_children: bool,
}

#[derive(Debug, Default)]
struct Header {
    level_names: Vec<String>,
    fields: Vec<(String, String)>,
}

impl Header {
    fn level_name(&self, level: usize) -> String {
        level
            .checked_sub(1)
            .and_then(|i| self.level_names.get(i))
            .cloned()
            .unwrap_or_else(|| format!("Level{}", level))
    }
}

fn corrupt(line: usize, message: impl Into<String>) -> ReadError {
    ReadError::CorruptLog { line, message: message.into() }
}

fn split_key_value(line: &str) -> Option<(String, String)> {
    KEY_VALUE
        .captures(line)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

/// Read decoded E-Prime log text into a data set.
pub fn read_log(content: &str) -> ReadResult<DataSet> {
    let mut lines = content.lines().enumerate().map(|(i, line)| (i + 1, line.trim()));

    let header = read_header(&mut lines)?;
    let frames = read_frames(&mut lines)?;
    Ok(build_rows(&header, &frames))
}

fn read_header<'a>(lines: &mut impl Iterator<Item = (usize, &'a str)>) -> ReadResult<Header> {
    let mut last_line = 0;
    let mut started = false;
    for (line_no, line) in lines.by_ref() {
        last_line = line_no;
        if line.is_empty() {
            continue;
        }
        if line == HEADER_START {
            started = true;
            break;
        }
        return Err(corrupt(line_no, format!("expected '{}' before '{}'", HEADER_START, line)));
    }
    if !started {
        return Err(corrupt(last_line.max(1), "no header"));
    }

    let mut header = Header::default();
    for (line_no, line) in lines.by_ref() {
        last_line = line_no;
        if line.is_empty() {
            continue;
        }
        if line == HEADER_END {
            return Ok(header);
        }
        let (key, value) =
            split_key_value(line).ok_or_else(|| corrupt(line_no, format!("invalid header line '{}'", line)))?;
        if key == "LevelName" {
            header.level_names.push(value);
        } else if key == "Experiment" {
            header.fields.push(("ExperimentName".to_string(), value));
        } else if key != "VersionPersist" {
            header.fields.push((key, value));
        }
    }
    Err(corrupt(last_line, "unterminated header"))
}

fn read_frames<'a>(lines: &mut impl Iterator<Item = (usize, &'a str)>) -> ReadResult<Vec<Frame>> {
    let mut frames: Vec<Frame> = Vec::new();
    let mut orphans: Vec<usize> = Vec::new();
    let mut pending_level: Option<usize> = None;
    let mut open: Option<(usize, Frame)> = None;
    let mut last_line = 0;

    for (line_no, line) in lines {
        last_line = line_no;
        if line.is_empty() {
            continue;
        }

        if line == FRAME_START {
            if open.is_some() {
                return Err(corrupt(line_no, "frame started inside an open frame"));
            }
            let level = pending_level
                .take()
                .ok_or_else(|| corrupt(line_no, "frame started without a 'Level' line"))?;
            let frame = Frame { level, fields: Vec::new(), parent: None, has_children: false };
            open = Some((line_no, frame));
            continue;
        }

        if line == FRAME_END {
            let (_, frame) = open
                .take()
                .ok_or_else(|| corrupt(line_no, "frame end without a frame start"))?;
            close_frame(&mut frames, &mut orphans, frame);
            continue;
        }

        match open.as_mut() {
            Some((_, frame)) => {
                let (key, value) = split_key_value(line)
                    .ok_or_else(|| corrupt(line_no, format!("invalid frame line '{}'", line)))?;
                frame.fields.push((key, value));
            }
            None => {
                let caps = LEVEL_LINE
                    .captures(line)
                    .ok_or_else(|| corrupt(line_no, format!("unexpected line outside a frame '{}'", line)))?;
                let level = caps[1]
                    .parse::<usize>()
                    .ok()
                    .filter(|level| *level > 0)
                    .ok_or_else(|| corrupt(line_no, format!("invalid level '{}'", &caps[1])))?;
                pending_level = Some(level);
            }
        }
    }

    if let Some((start_line, _)) = open {
        return Err(corrupt(start_line, "unterminated frame"));
    }
    if pending_level.is_some() {
        return Err(corrupt(last_line, "'Level' line without a frame"));
    }
    Ok(frames)
}

/// Push a closed frame, adopting the unparented frames deeper than it.
///
/// `orphans` holds the indices of frames without a parent. Its levels never
/// decrease from bottom to top, so the adopted frames are always on top.
fn close_frame(frames: &mut Vec<Frame>, orphans: &mut Vec<usize>, mut frame: Frame) {
    let index = frames.len();
    while let Some(&top) = orphans.last() {
        if frames[top].level <= frame.level {
            break;
        }
        frames[top].parent = Some(index);
        frame.has_children = true;
        orphans.pop();
    }
    frames.push(frame);
    orphans.push(index);
}

/// Keys seen at more than one level, which get a `[LevelName]` suffix.
fn shared_keys(header: &Header, frames: &[Frame]) -> HashMap<String, BTreeSet<usize>> {
    let mut levels: HashMap<String, BTreeSet<usize>> = HashMap::new();
    for (key, _) in &header.fields {
        levels.entry(key.clone()).or_default().insert(1);
    }
    for frame in frames {
        for (key, _) in &frame.fields {
            levels.entry(key.clone()).or_default().insert(frame.level);
        }
    }
    levels.retain(|_, seen| seen.len() > 1);
    levels
}

fn build_rows(header: &Header, frames: &[Frame]) -> DataSet {
    let shared = shared_keys(header, frames);
    let column_name = |key: &str, level: usize| -> String {
        if shared.contains_key(key) {
            format!("{}[{}]", key, header.level_name(level))
        } else {
            key.to_string()
        }
    };

    let mut data = DataSet::new();
    for (index, frame) in frames.iter().enumerate() {
        if frame.has_children {
            continue;
        }

        let mut lineage = vec![index];
        let mut current = frame.parent;
        while let Some(parent) = current {
            lineage.push(parent);
            current = frames[parent].parent;
        }

        let mut row = data.add_row();
        for (key, value) in &header.fields {
            row.set(column_name(key, 1), value.as_str());
        }
        for &i in lineage.iter().rev() {
            let level = frames[i].level;
            for (key, value) in &frames[i].fields {
                row.set(column_name(key, level), value.as_str());
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LOG: &str = "\
*** Header Start ***
VersionPersist: 1
LevelName: Session
LevelName: Block
LevelName: Trial
Experiment: stroop
SessionDate: 03-12-2008
Subject: 1
*** Header End ***
Level: 3
*** LogFrame Start ***
\tProcedure: TrialProc
\tRunning: TrialList
\tStimTime: 3188
\tStim.RT: 512
*** LogFrame End ***
Level: 3
*** LogFrame Start ***
\tProcedure: TrialProc
\tRunning: TrialList
\tStimTime: 4515
\tStim.RT:
*** LogFrame End ***
Level: 2
*** LogFrame Start ***
\tProcedure: BlockProc
\tRunning: BlockList
\tBlockTitle: congruent
*** LogFrame End ***
Level: 3
*** LogFrame Start ***
\tProcedure: TrialProc
\tRunning: TrialList
\tStimTime: 9815
*** LogFrame End ***
Level: 2
*** LogFrame Start ***
\tProcedure: BlockProc
\tRunning: BlockList
\tBlockTitle: incongruent
*** LogFrame End ***
Level: 1
*** LogFrame Start ***
\tSubject: 1
*** LogFrame End ***
";

    #[test]
    fn test_leaf_frames_become_rows() {
        let data = read_log(SAMPLE_LOG).unwrap();
        assert_eq!(data.len(), 3);

        let stim_times: Vec<_> = data.rows().map(|r| r.stored("StimTime").unwrap()).collect();
        assert_eq!(stim_times, vec!["3188", "4515", "9815"]);
    }

    #[test]
    fn test_rows_inherit_ancestors_and_header() {
        let data = read_log(SAMPLE_LOG).unwrap();

        let first = data.row(0).unwrap();
        assert_eq!(first.stored("ExperimentName"), Some("stroop"));
        assert_eq!(first.stored("Subject"), Some("1"));
        assert_eq!(first.stored("BlockTitle"), Some("congruent"));

        let last = data.row(2).unwrap();
        assert_eq!(last.stored("BlockTitle"), Some("incongruent"));
    }

    #[test]
    fn test_header_fields() {
        let data = read_log(SAMPLE_LOG).unwrap();
        let row = data.row(0).unwrap();
        assert_eq!(row.stored("VersionPersist"), None);
        assert_eq!(row.stored("LevelName"), None);
        assert_eq!(row.stored("Experiment"), None);
        assert_eq!(row.stored("SessionDate"), Some("03-12-2008"));
    }

    #[test]
    fn test_shared_keys_get_level_suffix() {
        let data = read_log(SAMPLE_LOG).unwrap();
        let row = data.row(1).unwrap();

        assert_eq!(row.stored("Procedure[Trial]"), Some("TrialProc"));
        assert_eq!(row.stored("Procedure[Block]"), Some("BlockProc"));
        assert_eq!(row.stored("Running[Trial]"), Some("TrialList"));
        assert_eq!(row.stored("Procedure"), None);
        // Subject only appears at level 1
        assert_eq!(row.stored("Subject"), Some("1"));
    }

    #[test]
    fn test_column_order_and_empty_values() {
        let data = read_log(SAMPLE_LOG).unwrap();
        assert_eq!(
            data.columns(),
            &[
                "ExperimentName",
                "SessionDate",
                "Subject",
                "Procedure[Block]",
                "Running[Block]",
                "BlockTitle",
                "Procedure[Trial]",
                "Running[Trial]",
                "StimTime",
                "Stim.RT",
            ]
        );
        assert_eq!(data.row(1).unwrap().stored("Stim.RT"), Some(""));
        assert_eq!(data.row(2).unwrap().stored("Stim.RT"), None);
    }

    #[test]
    fn test_unnamed_level_fallback() {
        let content = "\
*** Header Start ***
Subject: 1
*** Header End ***
Level: 2
*** LogFrame Start ***
Subject: 9
*** LogFrame End ***
";
        let data = read_log(content).unwrap();
        let row = data.row(0).unwrap();
        assert_eq!(row.stored("Subject[Level1]"), Some("1"));
        assert_eq!(row.stored("Subject[Level2]"), Some("9"));
    }

    #[test]
    fn test_childless_parent_level_is_a_row() {
        let content = "\
*** Header Start ***
LevelName: Session
LevelName: Block
*** Header End ***
Level: 2
*** LogFrame Start ***
BlockTitle: practice
*** LogFrame End ***
";
        let data = read_log(content).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.row(0).unwrap().stored("BlockTitle"), Some("practice"));
    }

    fn parents(levels: &[usize]) -> Vec<Option<usize>> {
        let mut frames = Vec::new();
        let mut orphans = Vec::new();
        for &level in levels {
            let frame = Frame { level, fields: Vec::new(), parent: None, has_children: false };
            close_frame(&mut frames, &mut orphans, frame);
        }
        frames.iter().map(|f| f.parent).collect()
    }

    #[test]
    fn test_adoption_skips_levels() {
        assert_eq!(parents(&[3, 3, 2, 3, 2, 1]), vec![Some(2), Some(2), Some(5), Some(4), Some(5), None]);
        assert_eq!(parents(&[4, 2, 3, 1]), vec![Some(1), Some(3), Some(3), None]);
        assert_eq!(parents(&[2, 3, 1]), vec![Some(2), Some(2), None]);
        assert_eq!(parents(&[1, 2]), vec![None, None]);
    }

    #[test]
    fn test_large_log() {
        let mut content = String::from("*** Header Start ***\nLevelName: Session\nLevelName: Block\nLevelName: Trial\n*** Header End ***\n");
        for block in 0..3 {
            for trial in 0..2000 {
                content.push_str(&format!(
                    "Level: 3\n*** LogFrame Start ***\nTrial: {}\n*** LogFrame End ***\n",
                    trial
                ));
            }
            content.push_str(&format!("Level: 2\n*** LogFrame Start ***\nBlock: {}\n*** LogFrame End ***\n", block));
        }
        content.push_str("Level: 1\n*** LogFrame Start ***\nSubject: 7\n*** LogFrame End ***\n");

        let data = read_log(&content).unwrap();
        assert_eq!(data.len(), 6000);
        let last = data.row(5999).unwrap();
        assert_eq!(last.stored("Block"), Some("2"));
        assert_eq!(last.stored("Trial"), Some("1999"));
        assert_eq!(last.stored("Subject"), Some("7"));
        assert_eq!(data.row(2000).unwrap().stored("Block"), Some("1"));
    }

    fn corrupt_line(content: &str) -> usize {
        match read_log(content) {
            Err(ReadError::CorruptLog { line, .. }) => line,
            other => panic!("expected corrupt log, got {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(corrupt_line("Level: 1\n"), 1);
        assert_eq!(corrupt_line(""), 1);
    }

    #[test]
    fn test_unterminated_header() {
        let line = corrupt_line("*** Header Start ***\nSubject: 1\n");
        assert_eq!(line, 2);
    }

    #[test]
    fn test_nested_frame_start() {
        let content = "\
*** Header Start ***
*** Header End ***
Level: 2
*** LogFrame Start ***
*** LogFrame Start ***
";
        assert_eq!(corrupt_line(content), 5);
    }

    #[test]
    fn test_frame_end_without_start() {
        let content = "*** Header Start ***\n*** Header End ***\n*** LogFrame End ***\n";
        assert_eq!(corrupt_line(content), 3);
    }

    #[test]
    fn test_unterminated_frame() {
        let content = "\
*** Header Start ***
*** Header End ***
Level: 2
*** LogFrame Start ***
Trial: 1
";
        assert_eq!(corrupt_line(content), 4);
    }

    #[test]
    fn test_bad_levels() {
        let missing = "*** Header Start ***\n*** Header End ***\n*** LogFrame Start ***\n";
        assert_eq!(corrupt_line(missing), 3);

        let invalid = "*** Header Start ***\n*** Header End ***\nLevel: two\n";
        assert_eq!(corrupt_line(invalid), 3);

        let zero = "*** Header Start ***\n*** Header End ***\nLevel: 0\n";
        assert_eq!(corrupt_line(zero), 3);
    }

    #[test]
    fn test_key_value_outside_frame() {
        let content = "*** Header Start ***\n*** Header End ***\nTrial: 1\n";
        assert_eq!(corrupt_line(content), 3);
    }
}
