//! Chart command drawing the nights away and home chart as SVG.
//!
//! All geometry comes from [`ChartLayout`]; this module only serializes it.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use lg_core::layout::{LineKind, Point, TextAnchor};
use lg_core::{ChartLayout, ChartParams, StayCollection};
use lg_db::Database;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::Config;
use crate::cli::RangeArgs;
use crate::commands::{stats, util};

const TITLE: &str = "Consecutive Nights Traveling or Home";
const CREDIT: &str = "Lodging log";

const STYLESHEET: &str = "
    text { font-family: 'Source Sans 3', 'Helvetica Neue', Arial, sans-serif; }
    .page-background { fill: #ffffff; }
    .chart-title { font-size: 28px; font-weight: 600; text-anchor: middle; fill: #222222; }
    .chart-subtitle { font-size: 14px; letter-spacing: 0.1em; text-anchor: middle; fill: #666666; }
    .header { fill: #f4f4f4; }
    .header-away, .header-home { font-size: 14px; fill: #444444; }
    .header-away { text-anchor: end; }
    .header-home { text-anchor: start; }
    .header-sub { font-weight: 600; }
    .axis { stroke: #444444; stroke-width: 1; }
    .gridline { stroke: #dddddd; stroke-width: 1; }
    .year-0 { fill: #ffffff; }
    .year-1 { fill: #f7f7f7; }
    .year-label { font-size: 12px; font-weight: 600; fill: #999999; }
    .night-away-business { fill: #1f77b4; }
    .night-away-personal { fill: #9467bd; }
    .night-home { fill: #2ca02c; }
    text.night-away-business, tspan.night-away-business { fill: #1f77b4; }
    text.night-away-personal, tspan.night-away-personal { fill: #9467bd; }
    text.night-home, tspan.night-home { fill: #2ca02c; }
    .highlight-away { fill: #e8e0f2; }
    .highlight-home { fill: #dff0df; }
    .note { font-size: 12px; fill: #333333; }
    .note-sub { font-size: 10px; letter-spacing: 0.08em; fill: #777777; }
    .note-start { text-anchor: start; }
    .note-end { text-anchor: end; }
    .footer { font-size: 10px; fill: #999999; }
    .credit { text-anchor: start; }
    .date-generated { text-anchor: end; }
";

// ========== SVG Writer ==========

/// Indenting SVG writer over `quick_xml`, which escapes text and attributes.
struct SvgWriter {
    xml: Writer<Vec<u8>>,
}

fn element<'a>(name: &'a str, attrs: &'a [(&str, String)]) -> BytesStart<'a> {
    BytesStart::new(name).with_attributes(attrs.iter().map(|(key, value)| (*key, value.as_str())))
}

impl SvgWriter {
    fn new() -> quick_xml::Result<Self> {
        let mut xml = Writer::new_with_indent(Vec::new(), b' ', 2);
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(Self { xml })
    }

    fn open(&mut self, name: &str, attrs: &[(&str, String)]) -> quick_xml::Result<()> {
        self.xml.write_event(Event::Start(element(name, attrs)))
    }

    fn close(&mut self, name: &str) -> quick_xml::Result<()> {
        self.xml.write_event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, String)]) -> quick_xml::Result<()> {
        self.xml.write_event(Event::Empty(element(name, attrs)))
    }

    fn content(&mut self, text: &str) -> quick_xml::Result<()> {
        self.xml.write_event(Event::Text(BytesText::new(text)))
    }

    fn text(&mut self, attrs: &[(&str, String)], content: &str) -> quick_xml::Result<()> {
        self.open("text", attrs)?;
        self.content(content)?;
        self.close("text")
    }

    fn tspan(&mut self, class: &str, content: &str) -> quick_xml::Result<()> {
        self.open("tspan", &[("class", class.to_string())])?;
        self.content(content)?;
        self.close("tspan")
    }

    fn stylesheet(&mut self, css: &str) -> quick_xml::Result<()> {
        self.open("style", &[])?;
        self.xml.write_event(Event::CData(BytesCData::new(css)))?;
        self.close("style")
    }

    fn group(
        &mut self,
        id: &str,
        body: impl FnOnce(&mut Self) -> quick_xml::Result<()>,
    ) -> quick_xml::Result<()> {
        self.open("g", &[("id", id.to_string())])?;
        body(self)?;
        self.close("g")
    }

    fn finish(self) -> Result<String> {
        let mut svg = String::from_utf8(self.xml.into_inner()).context("SVG is not UTF-8")?;
        svg.push('\n');
        Ok(svg)
    }
}

fn num(value: f64) -> String {
    value.to_string()
}

fn at(anchor: TextAnchor, class: &str) -> Vec<(&'static str, String)> {
    vec![
        ("x", num(anchor.x)),
        ("y", num(anchor.y)),
        ("class", class.to_string()),
    ]
}

fn points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

// ========== Chart Rendering ==========

/// Serializes the chart for `collection` as an SVG document.
pub fn render_svg(
    collection: &StayCollection,
    params: &ChartParams,
    generated_on: NaiveDate,
) -> Result<String> {
    let rows = collection.rows();
    let layout = ChartLayout::new(&rows, params).context("failed to lay out chart")?;
    let annotations = layout
        .annotations()
        .context("failed to place chart annotations")?;
    let space = layout.space();
    let range = collection.range();

    let mut svg = SvgWriter::new()?;
    svg.open(
        "svg",
        &[
            ("xmlns", "http://www.w3.org/2000/svg".to_string()),
            ("width", num(space.page_width)),
            ("height", num(space.page_height)),
            (
                "viewBox",
                format!("0 0 {} {}", space.page_width, space.page_height),
            ),
        ],
    )?;
    svg.stylesheet(STYLESHEET)?;

    svg.group("page-background", |svg| {
        svg.empty(
            "rect",
            &[
                ("x", num(0.0)),
                ("y", num(0.0)),
                ("width", num(space.page_width)),
                ("height", num(space.page_height)),
                ("class", "page-background".to_string()),
            ],
        )
    })?;

    svg.group("title", |svg| {
        let anchors = layout.title_anchors();
        svg.text(&at(anchors.title, "chart-title"), TITLE)?;
        let subtitle = format!(
            "from {} to {}",
            util::format_date(range.start_evening()),
            util::format_date(range.thru_morning())
        );
        svg.text(&at(anchors.subtitle, "chart-subtitle"), &subtitle.to_uppercase())
    })?;

    svg.group("header", |svg| {
        let header = layout.header();
        let bounds = header.bounds;
        svg.empty(
            "rect",
            &[
                ("x", num(bounds.left)),
                ("y", num(bounds.top)),
                ("width", num(bounds.width())),
                ("height", num(bounds.height())),
                ("class", "header".to_string()),
            ],
        )?;
        svg.empty(
            "line",
            &[
                ("x1", num(bounds.left)),
                ("y1", num(bounds.bottom)),
                ("x2", num(bounds.right)),
                ("y2", num(bounds.bottom)),
                ("class", "axis".to_string()),
            ],
        )?;

        svg.open("text", &at(header.away_label, "header header-away"))?;
        svg.content("Nights on ")?;
        svg.tspan("header-sub night-away-business", "work")?;
        svg.content("/")?;
        svg.tspan("header-sub night-away-personal", "personal")?;
        svg.content(" trips")?;
        svg.close("text")?;

        svg.open("text", &at(header.home_label, "header header-home"))?;
        svg.content("Nights at ")?;
        svg.tspan("header-sub night-home", "home")?;
        svg.close("text")
    })?;

    svg.group("chart-background", |svg| {
        for band in layout.year_bands() {
            svg.empty(
                "polygon",
                &[
                    ("points", points(&band.points)),
                    ("class", format!("year-{}", band.fill)),
                ],
            )?;
            if let (Some(year), Some(label)) = (band.year, band.label) {
                svg.text(
                    &at(TextAnchor { x: label.x, y: label.y }, "year-label"),
                    &year.to_string(),
                )?;
            }
        }
        Ok(())
    })?;

    svg.group("gridlines", |svg| {
        for line in layout.gridlines() {
            let class = match line.kind {
                LineKind::Axis => "axis",
                LineKind::Gridline => "gridline",
            };
            svg.empty(
                "line",
                &[
                    ("x1", num(line.x)),
                    ("y1", num(line.top)),
                    ("x2", num(line.x)),
                    ("y2", num(line.bottom)),
                    ("class", class.to_string()),
                ],
            )?;
        }
        Ok(())
    })?;

    svg.group("highlights", |svg| {
        for highlight in &annotations.highlights {
            svg.empty(
                "rect",
                &[
                    ("x", num(highlight.x)),
                    ("y", num(highlight.y)),
                    ("rx", num(highlight.rx)),
                    ("width", num(highlight.width)),
                    ("height", num(highlight.height)),
                    ("class", highlight.style.as_str().to_string()),
                ],
            )?;
        }
        Ok(())
    })?;

    svg.group("nights", |svg| {
        for night in layout.nights() {
            svg.empty(
                "circle",
                &[
                    ("cx", num(night.center.x)),
                    ("cy", num(night.center.y)),
                    ("r", num(night.radius)),
                    ("class", night.class.as_str().to_string()),
                ],
            )?;
        }
        Ok(())
    })?;

    svg.group("notes", |svg| {
        for note in &annotations.notes {
            let align = note.align.as_str();
            svg.text(
                &[
                    ("x", num(note.x)),
                    ("y", num(note.text_y)),
                    ("class", format!("note note-{align}")),
                ],
                &note.text,
            )?;
            if let Some(subtext) = &note.subtext {
                svg.text(
                    &[
                        ("x", num(note.x)),
                        ("y", num(note.subtext_y)),
                        ("class", format!("note note-sub note-{align}")),
                    ],
                    subtext,
                )?;
            }
        }
        Ok(())
    })?;

    svg.group("footer", |svg| {
        let footer = layout.footer();
        svg.text(&at(footer.left, "footer credit"), CREDIT)?;
        svg.text(
            &at(footer.right, "footer date-generated"),
            &format!("Generated on {}", util::format_date(generated_on)),
        )
    })?;

    svg.close("svg")?;

    tracing::debug!(
        rows = rows.len(),
        notes = annotations.notes.len(),
        "rendered chart"
    );
    svg.finish()
}

// ========== Public Interface ==========

/// Runs the chart command.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    config: &Config,
    output: &Path,
    stats_output: Option<&Path>,
    range: RangeArgs,
) -> Result<()> {
    let today = util::today();
    let range = util::resolve_range(db, range, today)?;
    let collection = util::load_collection(db, range)?;

    let svg = render_svg(&collection, &config.chart, today)?;
    let svg_path = config.output_path(output);
    util::write_file(&svg_path, |w| w.write_all(svg.as_bytes()))?;
    writeln!(writer, "Wrote SVG to {}", svg_path.display())?;

    if let Some(stats_output) = stats_output {
        let text = stats::format_stats(&collection, None);
        let stats_path = config.output_path(stats_output);
        util::write_file(&stats_path, |w| w.write_all(text.as_bytes()))?;
        writeln!(writer, "Wrote statistics to {}", stats_path.display())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_core::{DateRange, LocationKey, Purpose, StayRecord};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stay(checkout: NaiveDate, nights: u32, purpose: Purpose) -> StayRecord {
        StayRecord::new(
            checkout,
            nights,
            LocationKey::new("hotel").unwrap(),
            purpose,
            None,
        )
        .unwrap()
    }

    fn collection(start: NaiveDate, thru: NaiveDate, stays: &[StayRecord]) -> StayCollection {
        StayCollection::build(stays, DateRange::new(start, thru).unwrap()).unwrap()
    }

    #[test]
    fn test_writer_escapes_text_and_attributes() {
        let mut svg = SvgWriter::new().unwrap();
        svg.text(&[("class", "a&b".to_string())], "x < y & z").unwrap();
        let out = svg.finish().unwrap();
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <text class=\"a&amp;b\">x &lt; y &amp; z</text>\n"
        );
    }

    #[test]
    fn test_writer_nests_groups() {
        let mut svg = SvgWriter::new().unwrap();
        svg.group("nights", |svg| svg.empty("circle", &[("r", num(4.0))]))
            .unwrap();
        let out = svg.finish().unwrap();
        assert!(out.ends_with("<g id=\"nights\">\n  <circle r=\"4\"/>\n</g>\n"));
    }

    #[test]
    fn test_points_format() {
        let pts = [Point::new(40.0, 165.5), Point::new(202.0, 165.5)];
        assert_eq!(points(&pts), "40,165.5 202,165.5");
    }

    #[test]
    fn test_svg_draws_one_circle_per_night() {
        let collection = collection(
            date(2021, 5, 31),
            date(2021, 6, 10),
            &[
                stay(date(2021, 6, 5), 3, Purpose::Business),
                stay(date(2021, 6, 9), 1, Purpose::Personal),
            ],
        );
        let svg = render_svg(&collection, &ChartParams::default(), date(2021, 7, 1)).unwrap();

        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg "));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<circle ").count(), 10);
        assert_eq!(svg.matches("class=\"night-away-business\"/>").count(), 3);
        assert_eq!(svg.matches("class=\"night-away-personal\"/>").count(), 1);
        assert_eq!(svg.matches("class=\"night-home\"/>").count(), 6);
        assert!(svg.contains(">FROM 31 MAY 2021 TO 10 JUN 2021</text>"));
        assert!(svg.contains(">3 nights away</text>"));
        assert!(svg.contains(">2\u{2013}5 JUN 2021</text>"));
        assert!(svg.contains(">Generated on 1 Jul 2021</text>"));
        assert!(svg.contains("width=\"202\" height=\"290\""));
        assert_eq!(svg.matches("class=\"highlight-").count(), 2);
    }

    #[test]
    fn test_svg_labels_years() {
        let collection = collection(
            date(2021, 12, 20),
            date(2022, 1, 20),
            &[stay(date(2022, 1, 2), 4, Purpose::Personal)],
        );
        let svg = render_svg(&collection, &ChartParams::default(), date(2022, 2, 1)).unwrap();

        assert_eq!(svg.matches("<polygon ").count(), 2);
        assert!(svg.contains(">2021</text>"));
        assert!(svg.contains(">2022</text>"));
    }

    #[test]
    fn test_svg_requires_away_period() {
        let collection = collection(date(2021, 5, 31), date(2021, 6, 10), &[]);
        let err = render_svg(&collection, &ChartParams::default(), date(2021, 7, 1))
            .unwrap_err();
        assert!(format!("{err:#}").contains("no away periods in range"));
    }

    #[test]
    fn test_run_writes_svg_and_stats() {
        let temp = tempfile::tempdir().unwrap();
        let mut db = Database::open_in_memory().unwrap();
        let hotel = db
            .insert_stay_location("hotel", "Hotel", "Hotel", None)
            .unwrap();
        db.insert_stays(&[lg_db::NewStay {
            check_out_date: date(2021, 6, 5),
            nights: 3,
            purpose: Purpose::Business,
            stay_location_fid: hotel,
            absence_flags: None,
        }])
        .unwrap();

        let config = Config {
            output_dir: temp.path().to_path_buf(),
            ..Config::default()
        };
        let range = RangeArgs {
            start_evening: Some(date(2021, 5, 31)),
            thru_morning: Some(date(2021, 6, 10)),
        };
        let mut output = Vec::new();
        run(
            &mut output,
            &db,
            &config,
            Path::new("charts/nights.svg"),
            Some(Path::new("stats.txt")),
            range,
        )
        .unwrap();

        let svg = std::fs::read_to_string(temp.path().join("charts/nights.svg")).unwrap();
        assert_eq!(svg.matches("<circle ").count(), 10);
        let stats = std::fs::read_to_string(temp.path().join("stats.txt")).unwrap();
        assert!(stats.starts_with("Statistics for stays from 2021-05-31 to 2021-06-10:"));

        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.lines().count(), 2);
    }
}
