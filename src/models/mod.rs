mod rules;

pub use rules::{
    FieldRule, Stop, Strategy, HEADING_NUMBERING, HEADING_START, HEADING_WORD, RULES,
    SECTION_NUMBERING,
};
