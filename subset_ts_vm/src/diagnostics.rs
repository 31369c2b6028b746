//! Renders [`Diagnostic`]s the way a `tsc`-style checker reports them:
//! `file:line:col - error TS2322: message`, followed by the offending
//! source line and a caret under the span start. `Diagnostic.ip` only
//! means anything next to the [`SourceMapTable`] the image it came from
//! carries, so rendering takes both.

use crate::bytecode::SourceMapTable;
use crate::error::Diagnostic;
use subset_ts_vm_parser::SourceMap;

/// One diagnostic rendered to the multi-line form `tsc` prints on a
/// terminal. Falls back to a bare `file - error: message` line if `ip`
/// has no source-map entry (a host-side compiler bug, not expected in
/// practice — see the `SourceMapTable` doc comment on lookup order).
pub fn render(diag: &Diagnostic, source_map: &SourceMapTable, lines: &SourceMap, file_name: &str, source_text: &str) -> String {
    let Some(entry) = source_map.lookup(diag.ip) else {
        return format!("{file_name} - error: {}", diag.message);
    };
    let (line, col) = lines.line_col(entry.src_start as usize);
    let header = format!("{file_name}:{line}:{col} - error: {}", diag.message);
    let Some(text) = source_text.lines().nth(line.saturating_sub(1)) else {
        return header;
    };
    let caret = " ".repeat(col.saturating_sub(1)) + "^";
    format!("{header}\n{text}\n{caret}")
}

/// Render every diagnostic in order, separated by a blank line, the way
/// `tsc --pretty` lists multiple errors from one run.
pub fn render_all(diagnostics: &[Diagnostic], source_map: &SourceMapTable, file_name: &str, source_text: &str) -> String {
    let lines = SourceMap::new(source_text);
    diagnostics
        .iter()
        .map(|d| render(d, source_map, &lines, file_name, source_text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::SourceMapTable;

    #[test]
    fn renders_line_and_caret() {
        let mut table = SourceMapTable::new();
        table.push(0, 6, 12);
        let diag = Diagnostic {
            message: "type 'number' is not assignable to type 'string'".to_string(),
            ip: 0,
        };
        let source = "const x: string = 1;";
        let out = render_all(&[diag], &table, "input.ts", source);
        assert!(out.starts_with("input.ts:1:7 - error:"));
        assert!(out.contains(source));
        assert!(out.contains('^'));
    }

    #[test]
    fn falls_back_without_source_map_entry() {
        let table = SourceMapTable::new();
        let diag = Diagnostic {
            message: "unreachable".to_string(),
            ip: 99,
        };
        let out = render_all(&[diag], &table, "input.ts", "const x = 1;");
        assert_eq!(out, "input.ts - error: unreachable");
    }
}
