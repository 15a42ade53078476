//! Prompt rendering.
//!
//! Turns an `AnalysisResult` into the natural-language request sent to the
//! model: the source under test, the struct definitions its functions take,
//! the mocking convention, and the expected shape of the test.

use std::fmt::Write;

use crate::context::AnalysisResult;
use crate::resolve::StructDefinition;

const OPENING: &str =
    "can u write unit test on golang with heights coverage and multi scenario for this code";

const STRUCTS_INTRO: &str = "and i have some struct like this";

const EXPECTED_SHAPE: &str = "i expect the unit test like this
func Test_[function_name](t *testing.T) {

\t// add some preparation code here

\t// add schenario here with []struct

\t// looping schenario here and test the function
}
";

/// Render the generation prompt for one analyzed file.
pub fn render(result: &AnalysisResult) -> String {
    let mut out = String::new();
    out.push_str(OPENING);
    out.push_str("\n\n");
    out.push_str(&result.source_code);
    out.push_str("\n\n");

    if !result.structs.is_empty() {
        out.push_str(STRUCTS_INTRO);
        out.push_str("\n\n");
        for def in &result.structs {
            write_struct(&mut out, def);
        }
    }

    if let Some(mock) = &result.mock {
        let _ = writeln!(out, "and i use mock {} and the dir is {}\n", mock.name, mock.dir);
    }

    out.push_str(EXPECTED_SHAPE);
    out
}

fn write_struct(out: &mut String, def: &StructDefinition) {
    let _ = writeln!(out, "type {} struct {{", def.name);
    for field in &def.fields {
        let _ = writeln!(out, "\t{} {}", field.name, field.ty);
    }
    let _ = writeln!(out, "}}\nfrom {}\n", def.origin);
}
