//! Export of chord timelines, click tracks and the batch summary

pub mod json;
pub mod wav;

pub use json::{
    load_chords, read_existing_analysis, read_existing_projects, save_chords, write_summary,
    SUMMARY_FILE_NAME,
};
pub use wav::write_click_wav;
