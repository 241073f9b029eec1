//! `vb` domain markup for functions and module prose.
//!
//! A documented function renders as:
//!
//! ```text
//! .. vb:function:: Public Function Add(ByVal a As Integer, ByVal b As Integer) As Integer
//!    :module: Module1
//!
//!    Adds two numbers
//!
//!    :param a: First operand
//!    :type a: Integer
//!    :returns: The sum
//!    :rtype: Integer
//! ```

use crate::model::Declaration;
use crate::parser::xmldoc::FieldMap;

/// Directive body indentation.
const INDENT: &str = "   ";

/// Render a function-level block as a `vb:function` directive.
///
/// `:type:` fields are inferred from the declaration's parameter list and
/// skipped for documented parameters the signature does not have. `:rtype:`
/// comes from an explicit `<rtype>` field, else the declared return type.
pub fn render_function(
    signature: &str,
    decl: &Declaration,
    fields: &FieldMap,
    module: &str,
) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!(".. vb:function:: {}", signature));
    if !module.is_empty() {
        lines.push(format!("{}:module: {}", INDENT, module));
    }
    lines.push(String::new());

    if let Some(summary) = non_empty(fields.get("summary")) {
        push_indented(&mut lines, summary);
        lines.push(String::new());
    }

    let mut field_list: Vec<String> = Vec::new();
    for (name, text) in fields.params() {
        push_field(&mut field_list, &format!("param {}", name), text);
        if let Some(param) = decl.parameter(name) {
            push_field(&mut field_list, &format!("type {}", name), &param.display_type());
        }
    }
    if let Some(returns) = fields.returns() {
        push_field(&mut field_list, "returns", returns);
    }
    let rtype = non_empty(fields.get("rtype")).or(non_empty(Some(decl.return_type.as_str())));
    if let Some(rtype) = rtype {
        push_field(&mut field_list, "rtype", rtype);
    }
    if !field_list.is_empty() {
        for line in field_list {
            lines.push(indent_line(&line));
        }
        lines.push(String::new());
    }

    if let Some(remarks) = non_empty(fields.get("remarks")) {
        push_indented(&mut lines, remarks);
        lines.push(String::new());
    }

    if let Some(example) = non_empty(fields.get("example")) {
        lines.push(format!("{}.. code-block:: vbnet", INDENT));
        lines.push(String::new());
        for line in example.lines() {
            lines.push(indent_line(&indent_line(line)));
        }
        lines.push(String::new());
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Render a module-level block as plain page prose.
pub fn render_module_doc(fields: &FieldMap) -> String {
    let mut out = String::new();
    for key in ["summary", "remarks"] {
        if let Some(text) = non_empty(fields.get(key)) {
            out.push_str(text);
            out.push_str("\n\n");
        }
    }
    out
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

fn indent_line(line: &str) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!("{}{}", INDENT, line)
    }
}

fn push_indented(lines: &mut Vec<String>, text: &str) {
    lines.extend(text.lines().map(indent_line));
}

/// Append a `:name: body` field; continuation lines are indented under it.
fn push_field(lines: &mut Vec<String>, name: &str, body: &str) {
    let mut body_lines = body.lines();
    let first = body_lines.next().unwrap_or("");
    if first.is_empty() {
        lines.push(format!(":{}:", name));
    } else {
        lines.push(format!(":{}: {}", name, first));
    }
    lines.extend(body_lines.map(indent_line));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{signature, xmldoc};

    fn render(sig: &str, comment: &str, module: &str) -> String {
        let decl = signature::decompose(sig).unwrap();
        let fields = xmldoc::parse_fields(comment).unwrap();
        render_function(sig, &decl, &fields, module)
    }

    #[test]
    fn full_function_block() {
        let out = render(
            "Public Function Add(ByVal a As Integer, ByVal b As Integer) As Integer",
            "<summary>Adds two numbers</summary>\
             <param name=\"a\">First</param><param name=\"b\">Second</param>\
             <returns>The sum</returns><remarks>Overflow wraps.</remarks>",
            "Module1",
        );
        assert_eq!(
            out,
            ".. vb:function:: Public Function Add(ByVal a As Integer, ByVal b As Integer) As Integer\n\
             \x20  :module: Module1\n\
             \n\
             \x20  Adds two numbers\n\
             \n\
             \x20  :param a: First\n\
             \x20  :type a: Integer\n\
             \x20  :param b: Second\n\
             \x20  :type b: Integer\n\
             \x20  :returns: The sum\n\
             \x20  :rtype: Integer\n\
             \n\
             \x20  Overflow wraps.\n\
             \n"
        );
    }

    #[test]
    fn unknown_param_has_no_type() {
        let out = render("Sub Log(ByVal msg As String)", "<param name=\"level\">Unused</param>", "");
        assert!(out.contains(":param level: Unused"));
        assert!(!out.contains(":type level:"));
        assert!(!out.contains(":module:"));
        assert!(!out.contains(":rtype:"));
    }

    #[test]
    fn explicit_rtype_wins() {
        let out = render("Function Items() As Collection", "<rtype>Collection of String</rtype>", "");
        assert!(out.contains(":rtype: Collection of String"));
    }

    #[test]
    fn multi_line_summary_each_line_indented() {
        let out = render("Sub Run()", "<summary>\nLine one\nLine two\n</summary>", "M");
        assert!(out.contains("\n   Line one\n   Line two\n"));
    }

    #[test]
    fn multi_line_param_continues_under_field() {
        let out = render("Sub Run(x As Long)", "<param name=\"x\">first\nsecond</param>", "");
        assert!(out.contains("   :param x: first\n      second\n"));
    }

    #[test]
    fn module_doc_is_unindented() {
        let fields = xmldoc::parse_fields("<summary>Math helpers</summary><remarks>Pure VBA.</remarks>").unwrap();
        assert_eq!(render_module_doc(&fields), "Math helpers\n\nPure VBA.\n\n");
    }

    #[test]
    fn example_becomes_code_block() {
        let out = render("Sub Run()", "<example>Run\nRun</example>", "");
        assert!(out.contains("   .. code-block:: vbnet\n\n      Run\n      Run\n"));
    }
}
