use std::fmt::Write;

use crate::utils::time::format_date;

use super::ReportData;

/// Renders the report as a standalone HTML page: one row per project, one column per user, cells
/// hold tracked seconds. Output is stable for the same input.
pub fn render(report: &ReportData) -> String {
    let from = format_date(report.date_from);
    let to = format_date(report.date_to);

    let mut html = String::new();
    // writing into a String never fails
    let _ = write_document(&mut html, report, &from, &to);
    html
}

fn write_document(
    html: &mut String,
    report: &ReportData,
    from: &str,
    to: &str,
) -> std::fmt::Result {
    write!(
        html,
        r#"<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>rt-bot-34 report {from} - {to}</title>
  </head>
  <body>
    <h1>{from} - {to}</h1>
    <table>
      <thead>
        <tr>
          <th>&nbsp;</th>
"#
    )?;
    for user in &report.users {
        write!(html, "        \n          <th>{}</th>\n", escape(&user.name))?;
    }
    html.push_str("        \n        </tr>\n      </thead>\n      <tbody>\n");

    for project in &report.projects {
        write!(
            html,
            "      \n        <tr>\n          <td>{}</td>\n",
            escape(&project.name)
        )?;
        for user in &report.users {
            write!(
                html,
                "        \n          <td>{}</td>\n",
                report.spent(user.id, project.id)
            )?;
        }
        html.push_str("        \n        </tr>\n");
    }

    html.push_str("      \n      </tbody>\n    </table>\n  </body>\n</html>");
    Ok(())
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use crate::report::{tests::test_report, ProjectSummary, ReportData, UserSummary};

    use super::render;

    pub const EXPECTED_HTML: &str = concat!(
        "<!DOCTYPE html>\n",
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" lang=\"en\">\n",
        "  <head>\n",
        "    <meta charset=\"utf-8\" />\n",
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        "    <title>rt-bot-34 report 2001-02-03 - 2001-02-04</title>\n",
        "  </head>\n",
        "  <body>\n",
        "    <h1>2001-02-03 - 2001-02-04</h1>\n",
        "    <table>\n",
        "      <thead>\n",
        "        <tr>\n",
        "          <th>&nbsp;</th>\n",
        "        \n",
        "          <th>Alice</th>\n",
        "        \n",
        "          <th>Bob</th>\n",
        "        \n",
        "          <th>Clara</th>\n",
        "        \n",
        "        </tr>\n",
        "      </thead>\n",
        "      <tbody>\n",
        "      \n",
        "        <tr>\n",
        "          <td>Project A</td>\n",
        "        \n",
        "          <td>2700</td>\n",
        "        \n",
        "          <td>300</td>\n",
        "        \n",
        "          <td>0</td>\n",
        "        \n",
        "        </tr>\n",
        "      \n",
        "        <tr>\n",
        "          <td>Project B</td>\n",
        "        \n",
        "          <td>2700</td>\n",
        "        \n",
        "          <td>900</td>\n",
        "        \n",
        "          <td>1200</td>\n",
        "        \n",
        "        </tr>\n",
        "      \n",
        "        <tr>\n",
        "          <td>Project C</td>\n",
        "        \n",
        "          <td>3600</td>\n",
        "        \n",
        "          <td>0</td>\n",
        "        \n",
        "          <td>1200</td>\n",
        "        \n",
        "        </tr>\n",
        "      \n",
        "      </tbody>\n",
        "    </table>\n",
        "  </body>\n",
        "</html>",
    );

    #[test]
    fn test_render_report_to_html_returns_html() {
        assert_eq!(render(&test_report()), EXPECTED_HTML);
    }

    #[test]
    fn test_render_is_stable() {
        let report = test_report();
        assert_eq!(render(&report), render(&report.clone()));
    }

    #[test]
    fn test_names_are_escaped() {
        let report = ReportData {
            users: vec![UserSummary {
                id: 1,
                name: "<Eve & Co>".into(),
            }],
            projects: vec![ProjectSummary {
                id: 9,
                name: "R&D \"core\"".into(),
            }],
            spent_time: HashMap::new(),
            ..test_report()
        };
        let html = render(&report);
        assert!(html.contains("<th>&lt;Eve &amp; Co&gt;</th>"));
        assert!(html.contains("<td>R&amp;D &quot;core&quot;</td>"));
        assert!(html.contains("<td>0</td>"));
    }
}
