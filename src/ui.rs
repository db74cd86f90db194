use crate::models::{
    Cell, ChartPoint, Condition, RecordValue, SeriesResponse, TaskDefinition, TaskKind, WeekView,
};
use chrono::{Duration, NaiveDate};
use std::fmt::Write;

const CHART_WIDTH: f64 = 600.0;
const CHART_HEIGHT: f64 = 200.0;
const CHART_PAD: f64 = 32.0;

pub fn render_index(week: &WeekView, chart: &SeriesResponse, config: &[TaskDefinition]) -> String {
    let prev = shift_week(&week.start_date, -7);
    let next = shift_week(&week.start_date, 7);
    let days: Vec<&str> = week.rows.iter().map(|row| row.date.as_str()).collect();

    let score_lines = [(chart.score_segments.as_slice(), "line-score")];
    let time_lines = [
        (chart.wake_segments.as_slice(), "line-wake"),
        (chart.sleep_segments.as_slice(), "line-sleep"),
    ];

    INDEX_HTML
        .replace("{{WEEK_LABEL}}", &escape_html(&week.label))
        .replace("{{PREV}}", &prev)
        .replace("{{NEXT}}", &next)
        .replace("{{HEAD}}", &render_head(week))
        .replace("{{ROWS}}", &render_rows(week, config))
        .replace("{{SCORE_CHART}}", &render_chart(&days, &score_lines, 0.0, 100.0, false))
        .replace("{{TIME_CHART}}", &render_chart(&days, &time_lines, 0.0, 30.0, true))
        .replace("{{SPANS}}", &render_spans(chart))
        .replace("{{TASKS}}", &render_task_list(config))
}

fn render_head(week: &WeekView) -> String {
    let mut html = String::from("<th>Day</th><th>Date</th>");
    for column in &week.columns {
        let _ = write!(
            html,
            "<th>{}<br><span class=\"pts\">{}pts</span></th>",
            escape_html(&column.name),
            column.weight
        );
    }
    html.push_str("<th>Score</th>");
    html
}

fn render_rows(week: &WeekView, config: &[TaskDefinition]) -> String {
    let mut html = String::new();
    for row in &week.rows {
        let _ = write!(html, "<tr><td class=\"day\">{}</td><td>{}</td>", row.weekday, row.date);
        for (cell, task) in row.cells.iter().zip(config) {
            match cell {
                Cell::NotApplicable => html.push_str("<td class=\"na\">--</td>"),
                Cell::Value(value) => {
                    let _ = write!(html, "<td>{}</td>", render_input(&row.date, task, value.as_ref()));
                }
            }
        }
        let _ = write!(
            html,
            "<td class=\"score {}\">{:.0}%</td></tr>",
            row.band.css_class(),
            row.score.percent
        );
    }
    html
}

fn render_input(date: &str, task: &TaskDefinition, value: Option<&RecordValue>) -> String {
    let name = escape_html(&task.name);
    match task.kind {
        TaskKind::Bool => {
            let checked = if value.is_some_and(RecordValue::is_truthy) { " checked" } else { "" };
            format!(
                "<input type=\"checkbox\" data-date=\"{date}\" data-task=\"{name}\" data-kind=\"bool\"{checked}>"
            )
        }
        TaskKind::Score => format!(
            "<input type=\"number\" min=\"0\" max=\"100\" placeholder=\"0-100\" data-date=\"{date}\" data-task=\"{name}\" data-kind=\"score\" value=\"{}\">",
            escape_html(&display_value(value))
        ),
        TaskKind::Time => format!(
            "<input type=\"time\" data-date=\"{date}\" data-task=\"{name}\" data-kind=\"time\" value=\"{}\">",
            escape_html(&display_value(value))
        ),
    }
}

fn display_value(value: Option<&RecordValue>) -> String {
    match value {
        Some(RecordValue::Text(text)) => text.clone(),
        Some(RecordValue::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Draws each run as its own polyline so missing days leave a visible gap.
fn render_chart(
    days: &[&str],
    lines: &[(&[Vec<ChartPoint>], &str)],
    min: f64,
    max: f64,
    clock_axis: bool,
) -> String {
    let step = if days.len() > 1 {
        (CHART_WIDTH - CHART_PAD * 2.0) / (days.len() - 1) as f64
    } else {
        0.0
    };
    let x = |date: &str| {
        days.iter()
            .position(|day| *day == date)
            .map(|index| CHART_PAD + index as f64 * step)
    };
    let y = |value: f64| {
        let clamped = value.clamp(min, max);
        CHART_HEIGHT - CHART_PAD - (clamped - min) / (max - min) * (CHART_HEIGHT - CHART_PAD * 2.0)
    };

    let mut svg = format!(
        "<svg viewBox=\"0 0 {CHART_WIDTH} {CHART_HEIGHT}\" role=\"img\" class=\"chart\">"
    );

    let ticks = if clock_axis { [0.0, 6.0, 12.0, 18.0, 24.0, 30.0] } else { [0.0, 20.0, 40.0, 60.0, 80.0, 100.0] };
    for tick in ticks {
        let label = if clock_axis {
            format!("{:02}:00", tick as u32 % 24)
        } else {
            format!("{tick}%")
        };
        let _ = write!(
            svg,
            "<line class=\"grid\" x1=\"{CHART_PAD}\" x2=\"{}\" y1=\"{y:.1}\" y2=\"{y:.1}\"/><text class=\"axis\" x=\"2\" y=\"{y:.1}\">{label}</text>",
            CHART_WIDTH - CHART_PAD,
            y = y(tick)
        );
    }

    for (index, day) in days.iter().enumerate() {
        let _ = write!(
            svg,
            "<text class=\"axis\" x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\">{}</text>",
            CHART_PAD + index as f64 * step,
            CHART_HEIGHT - 8.0,
            day.get(5..).unwrap_or(*day)
        );
    }

    for (segments, class) in lines {
        for run in segments.iter() {
            let coords: Vec<(f64, f64)> = run
                .iter()
                .filter_map(|point| x(&point.date).map(|px| (px, y(point.value))))
                .collect();
            if coords.len() > 1 {
                let path: Vec<String> = coords.iter().map(|(px, py)| format!("{px:.1},{py:.1}")).collect();
                let _ = write!(svg, "<polyline class=\"{class}\" points=\"{}\"/>", path.join(" "));
            }
            for (px, py) in coords {
                let _ = write!(svg, "<circle class=\"{class}\" cx=\"{px:.1}\" cy=\"{py:.1}\" r=\"3\"/>");
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

fn render_spans(chart: &SeriesResponse) -> String {
    if chart.sleep_spans.is_empty() {
        return String::from("<li class=\"muted\">No complete nights recorded this week.</li>");
    }
    chart
        .sleep_spans
        .iter()
        .map(|span| format!("<li>{} &rarr; {}: {:.1}h</li>", span.slept_on, span.woke_on, span.hours))
        .collect()
}

fn render_task_list(config: &[TaskDefinition]) -> String {
    let mut html = String::new();
    for (index, task) in config.iter().enumerate() {
        let mut detail = format!("{:?}, {}pts, {}", task.kind, task.weight, task.days).to_lowercase();
        if task.kind == TaskKind::Time {
            let condition = match task.condition() {
                Condition::Before => "before",
                Condition::After => "after",
            };
            let _ = write!(detail, ", {condition} {}", task.target_or_midnight());
        }
        match (task.start_date, task.end_date) {
            (Some(start), Some(end)) if start == end => {
                let _ = write!(detail, ", on {start}");
            }
            (Some(start), Some(end)) => {
                let _ = write!(detail, ", {start} to {end}");
            }
            (Some(start), None) => {
                let _ = write!(detail, ", from {start}");
            }
            (None, Some(end)) => {
                let _ = write!(detail, ", until {end}");
            }
            (None, None) => {}
        }
        let encoded = serde_json::to_string(task).unwrap_or_default();
        let _ = write!(
            html,
            "<li><strong>{}</strong> <span class=\"muted\">({})</span> \
             <button data-edit=\"{index}\" data-definition=\"{}\">Edit</button>\
             <button data-move=\"up\" data-index=\"{index}\">&uarr;</button>\
             <button data-move=\"down\" data-index=\"{index}\">&darr;</button>\
             <button data-delete=\"{index}\">Delete</button></li>",
            escape_html(&task.name),
            escape_html(&detail),
            escape_html(&encoded)
        );
    }
    html
}

fn shift_week(start: &str, days: i64) -> String {
    NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .map(|date| (date + Duration::days(days)).to_string())
        .unwrap_or_default()
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>FocusGrid</title>
  <style>
    :root { --bg: #050b14; --card: #0f172a; --line: #1e293b; --text: #e2e8f0; --muted: #94a3b8;
            --cyan: #06b6d4; --green: #10b981; --purple: #8b5cf6; --red: #f43f5e; --yellow: #facc15; }
    body { margin: 0; background: var(--bg); color: var(--text); font-family: "Helvetica Neue", Arial, sans-serif; }
    main { max-width: 1280px; margin: 0 auto; padding: 24px; display: grid; gap: 24px; }
    nav { display: flex; align-items: center; justify-content: space-between; }
    nav a, button { color: var(--bg); background: var(--cyan); border: none; border-radius: 6px;
                    padding: 6px 12px; text-decoration: none; font-weight: 600; cursor: pointer; }
    table { width: 100%; border-collapse: collapse; background: var(--card); }
    th, td { border: 1px solid var(--line); padding: 6px; text-align: center; }
    .pts { font-size: 0.7em; color: var(--muted); }
    .day { color: var(--cyan); font-weight: bold; }
    .na { color: var(--muted); background: #0b1220; }
    .score-high { color: var(--green); } .score-mid { color: var(--yellow); } .score-low { color: var(--red); }
    input { background: var(--bg); color: var(--text); border: 1px solid var(--line); color-scheme: dark; }
    .charts { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }
    .card { background: var(--card); border: 1px solid var(--line); border-radius: 8px; padding: 12px; }
    .chart { width: 100%; }
    .grid { stroke: var(--line); } .axis { fill: var(--muted); font-size: 10px; }
    polyline { fill: none; stroke-width: 2; }
    .line-score { stroke: var(--green); fill: var(--green); }
    .line-wake { stroke: var(--cyan); fill: var(--cyan); }
    .line-sleep { stroke: var(--purple); fill: var(--purple); }
    polyline.line-score, polyline.line-wake, polyline.line-sleep { fill: none; }
    .muted { color: var(--muted); }
    #status { min-height: 1.2em; color: var(--muted); }
    form.task { display: flex; flex-wrap: wrap; gap: 8px; align-items: center; }
  </style>
</head>
<body>
  <main>
    <nav>
      <a href="/?week={{PREV}}">&laquo; Prev week</a>
      <h1>{{WEEK_LABEL}}</h1>
      <a href="/?week={{NEXT}}">Next week &raquo;</a>
    </nav>

    <table>
      <thead><tr>{{HEAD}}</tr></thead>
      <tbody>{{ROWS}}</tbody>
    </table>
    <div id="status"></div>

    <section class="charts">
      <div class="card"><h3>Efficiency (%)</h3>{{SCORE_CHART}}</div>
      <div class="card">
        <h3>Wake (cyan) &amp; Sleep (purple)</h3>{{TIME_CHART}}
        <ul>{{SPANS}}</ul>
      </div>
    </section>

    <section class="card">
      <h3>Tasks</h3>
      <ul id="tasks">{{TASKS}}</ul>
      <form class="task" id="task-form">
        <input name="name" placeholder="Name" required>
        <select name="type"><option>bool</option><option>score</option><option>time</option></select>
        <input name="weight" type="number" min="1" value="10">
        <input name="target" type="time">
        <select name="condition"><option>before</option><option>after</option></select>
        <input name="days" value="Daily" title="Daily or Mon,Tue,...">
        <input name="once" type="date" title="Only on this date">
        <label class="muted">from <input name="startDate" type="date"></label>
        <label class="muted">to <input name="endDate" type="date"></label>
        <button type="submit" id="task-submit">Add task</button>
        <button type="reset" id="task-cancel" hidden>Cancel</button>
      </form>
    </section>
  </main>

  <script>
    const statusEl = document.getElementById('status');
    const setStatus = (message) => { statusEl.textContent = message; };

    setInterval(() => { fetch('/heartbeat', { method: 'POST' }).catch(() => {}); }, 1000);

    const send = async (method, url, body) => {
      const res = await fetch(url, {
        method,
        headers: { 'content-type': 'application/json' },
        body: body === undefined ? undefined : JSON.stringify(body)
      });
      if (!res.ok) {
        throw new Error((await res.text()) || 'Request failed');
      }
      return res;
    };

    document.querySelectorAll('input[data-task]').forEach((input) => {
      input.addEventListener('change', () => {
        const value = input.dataset.kind === 'bool' ? input.checked : input.value;
        send('POST', '/api/record', { date: input.dataset.date, task: input.dataset.task, value })
          .then(() => window.location.reload())
          .catch((err) => setStatus(err.message));
      });
    });

    document.querySelectorAll('button[data-move]').forEach((button) => {
      button.addEventListener('click', () => {
        send('POST', `/api/tasks/${button.dataset.index}/move`, { direction: button.dataset.move })
          .then(() => window.location.reload())
          .catch((err) => setStatus(err.message));
      });
    });

    document.querySelectorAll('button[data-delete]').forEach((button) => {
      button.addEventListener('click', () => {
        if (!confirm('Delete this task?')) return;
        send('DELETE', `/api/tasks/${button.dataset.delete}`)
          .then(() => window.location.reload())
          .catch((err) => setStatus(err.message));
      });
    });

    const taskForm = document.getElementById('task-form');
    const submitButton = document.getElementById('task-submit');
    const cancelButton = document.getElementById('task-cancel');
    let editIndex = null;

    document.querySelectorAll('button[data-edit]').forEach((button) => {
      button.addEventListener('click', () => {
        const task = JSON.parse(button.dataset.definition);
        editIndex = button.dataset.edit;
        taskForm.elements.name.value = task.name;
        taskForm.elements.type.value = task.type;
        taskForm.elements.weight.value = task.weight;
        taskForm.elements.target.value = task.target || '';
        taskForm.elements.condition.value = task.condition || 'before';
        taskForm.elements.days.value = task.days || 'Daily';
        taskForm.elements.once.value = '';
        taskForm.elements.startDate.value = task.startDate || '';
        taskForm.elements.endDate.value = task.endDate || '';
        submitButton.textContent = 'Save task';
        cancelButton.hidden = false;
      });
    });

    taskForm.addEventListener('reset', () => {
      editIndex = null;
      submitButton.textContent = 'Add task';
      cancelButton.hidden = true;
    });

    taskForm.addEventListener('submit', (event) => {
      event.preventDefault();
      const form = new FormData(event.target);
      const task = {
        name: form.get('name'),
        type: form.get('type'),
        weight: Number(form.get('weight')),
        days: form.get('days') || 'Daily'
      };
      if (task.type === 'time') {
        task.target = form.get('target') || '00:00';
        task.condition = form.get('condition');
      }
      if (form.get('startDate')) task.startDate = form.get('startDate');
      if (form.get('endDate')) task.endDate = form.get('endDate');
      if (form.get('once')) task.once = form.get('once');
      const request = editIndex === null
        ? send('POST', '/api/tasks', task)
        : send('PUT', `/api/tasks/${editIndex}`, task);
      request
        .then(() => window.location.reload())
        .catch((err) => setStatus(err.message));
    });
  </script>
</body>
</html>
"#;
