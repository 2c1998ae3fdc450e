//! Chart geometry for the nights away and home timeline.
//!
//! Each row of the chart is one away period followed by the home period after
//! it. A shared vertical axis separates the two: away nights are drawn to the
//! left of the axis, ending next to it, and home nights to the right, starting
//! next to it. Every value here is a pure function of the rows and a
//! [`ChartParams`] table, so the renderer only has to serialize primitives.
//!
//! # Coordinates
//!
//! A night is addressed by `(row, offset)`: `offset` is the signed number of
//! cells from the axis. The i-th away night (oldest first) of an n-night
//! period sits at `i - n`, giving `-n..=-1`; the i-th home night sits at
//! `i + 1`.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::TimelineError;
use crate::period::StayPeriod;
use crate::rows::Row;
use crate::stats;
use crate::types::{Purpose, Status};

/// A point or offset in page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box in page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Fixed sizes used by the chart, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartParams {
    /// Space below the last row of nights.
    pub chart_padding_bottom: f64,
    /// Distance from the page bottom to the footer baseline.
    pub footer_padding_bottom: f64,
    pub header_height: f64,
    /// Header label offset from the axis (x) and header top (y).
    pub header_text_offset: Point,
    pub highlight_radius: f64,
    /// Width and height of one night's cell.
    pub cell_size: f64,
    /// Radius of one night's dot.
    pub night_radius: f64,
    pub note_text_offset: f64,
    pub note_subtext_offset: f64,
    pub page_margin: f64,
    pub title_height: f64,
    pub title_text_offset: f64,
    pub title_subtext_offset: f64,
    /// Extra room left of the longest away run, for year labels.
    pub year_margin: f64,
    pub year_text_offset: Point,
}

impl Default for ChartParams {
    fn default() -> Self {
        Self {
            chart_padding_bottom: 45.0,
            footer_padding_bottom: 16.0,
            header_height: 40.0,
            header_text_offset: Point::new(6.0, 25.0),
            highlight_radius: 6.0,
            cell_size: 8.0,
            night_radius: 3.0,
            note_text_offset: 22.0,
            note_subtext_offset: 40.0,
            page_margin: 40.0,
            title_height: 85.0,
            title_text_offset: 32.0,
            title_subtext_offset: 66.0,
            year_margin: 50.0,
            year_text_offset: Point::new(5.0, 15.0),
        }
    }
}

/// Dimensions and anchors derived once from the rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartCoordinateSpace {
    pub cell_size: f64,
    pub away_width: f64,
    pub home_width: f64,
    pub chart_width: f64,
    pub chart_height: f64,
    pub page_width: f64,
    pub page_height: f64,
    pub page_center: Point,
    pub title: Bounds,
    pub header: Bounds,
    pub chart: Bounds,
    /// X position of the axis between away and home nights.
    pub axis_x: f64,
    /// Center of the night at offset 0 on row 0.
    pub night_anchor: Point,
}

impl ChartCoordinateSpace {
    fn compute(params: &ChartParams, max_away: u32, max_home: u32, rows: usize) -> Self {
        let cell = params.cell_size;
        let margin = params.page_margin;

        let away_width = (1.5 + f64::from(max_away)) * cell + params.year_margin;
        let home_width = (1.5 + f64::from(max_home)) * cell;
        let chart_width = away_width + home_width;
        let chart_height = params.chart_padding_bottom + (count(rows) + 2.0) * cell;
        let page_width = 2.0 * margin + chart_width;
        let page_height =
            2.0 * margin + params.title_height + params.header_height + chart_height;

        let left = margin;
        let right = margin + chart_width;
        let title = Bounds {
            left,
            right,
            top: margin,
            bottom: margin + params.title_height,
        };
        let header = Bounds {
            left,
            right,
            top: title.bottom,
            bottom: title.bottom + params.header_height,
        };
        let chart = Bounds {
            left,
            right,
            top: header.bottom,
            bottom: header.bottom + chart_height,
        };
        let axis_x = margin + away_width;

        Self {
            cell_size: cell,
            away_width,
            home_width,
            chart_width,
            chart_height,
            page_width,
            page_height,
            page_center: Point::new(page_width / 2.0, page_height / 2.0),
            title,
            header,
            chart,
            axis_x,
            night_anchor: Point::new(axis_x, header.bottom + 1.5 * cell),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn count(n: usize) -> f64 {
    n as f64
}

#[allow(clippy::cast_precision_loss)]
fn cells(n: i64) -> f64 {
    n as f64
}

/// Position of a night on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NightPosition {
    pub row: usize,
    pub offset: i64,
}

/// How a night's dot is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NightClass {
    AwayBusiness,
    AwayPersonal,
    Home,
}

impl NightClass {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AwayBusiness => "night-away-business",
            Self::AwayPersonal => "night-away-personal",
            Self::Home => "night-home",
        }
    }
}

impl From<Purpose> for NightClass {
    fn from(purpose: Purpose) -> Self {
        match purpose {
            Purpose::Business => Self::AwayBusiness,
            Purpose::Personal => Self::AwayPersonal,
        }
    }
}

/// One night's dot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NightDot {
    pub center: Point,
    pub radius: f64,
    pub class: NightClass,
}

/// Whether a vertical line is the axis or a weekly gridline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineKind {
    Axis,
    Gridline,
}

/// A vertical line across the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gridline {
    /// Weeks from the axis; negative on the away side.
    pub week: i64,
    pub x: f64,
    pub top: f64,
    pub bottom: f64,
    pub kind: LineKind,
}

/// Background shading for one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearBand {
    /// `None` when the chart has no year boundary at all.
    pub year: Option<i32>,
    /// Alternating fill, 0 or 1.
    pub fill: u8,
    pub points: Vec<Point>,
    /// Where the year's label goes, if the band has a year.
    pub label: Option<Point>,
}

/// Style of a highlight box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HighlightStyle {
    Away,
    Home,
}

impl HighlightStyle {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Away => "highlight-away",
            Self::Home => "highlight-home",
        }
    }
}

/// A rounded rectangle drawn behind a period's nights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Highlight {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rx: f64,
    pub style: HighlightStyle,
}

/// Which side of the anchor night a note's text extends from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoteAlign {
    /// Text starts at the night's leading edge.
    Start,
    /// Text ends at the night's trailing edge.
    End,
}

impl NoteAlign {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

/// A text annotation below a night.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub x: f64,
    pub text_y: f64,
    pub subtext_y: f64,
    pub align: NoteAlign,
    pub text: String,
    /// Secondary label, upper-cased.
    pub subtext: Option<String>,
}

/// Highlights and notes for the chart's extremal periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotations {
    pub highlights: Vec<Highlight>,
    pub notes: Vec<Note>,
}

/// A text baseline anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextAnchor {
    pub x: f64,
    pub y: f64,
}

/// Title and subtitle anchors, both horizontally centered on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TitleAnchors {
    pub title: TextAnchor,
    pub subtitle: TextAnchor,
}

/// Header box, its bottom rule, and the away/home labels either side of the axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeaderLayout {
    pub bounds: Bounds,
    pub away_label: TextAnchor,
    pub home_label: TextAnchor,
}

/// Footer anchors at the chart's left and right edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FooterAnchors {
    pub left: TextAnchor,
    pub right: TextAnchor,
}

/// Geometry for a full chart.
#[derive(Debug, Clone)]
pub struct ChartLayout<'a> {
    rows: &'a [Row<'a>],
    params: &'a ChartParams,
    max_away: u32,
    max_home: u32,
    space: ChartCoordinateSpace,
}

impl<'a> ChartLayout<'a> {
    /// Computes the coordinate space for `rows`.
    pub fn new(rows: &'a [Row<'a>], params: &'a ChartParams) -> Result<Self, TimelineError> {
        if rows.is_empty() {
            return Err(TimelineError::EmptyLayout);
        }
        let max_away = rows
            .iter()
            .filter_map(|r| r.away.map(|p| p.nights))
            .max()
            .unwrap_or(0);
        let max_home = rows
            .iter()
            .filter_map(|r| r.home.map(|p| p.nights))
            .max()
            .unwrap_or(0);
        let space = ChartCoordinateSpace::compute(params, max_away, max_home, rows.len());

        tracing::debug!(
            rows = rows.len(),
            max_away,
            max_home,
            width = space.page_width,
            height = space.page_height,
            "computed chart layout"
        );

        Ok(Self {
            rows,
            params,
            max_away,
            max_home,
            space,
        })
    }

    #[must_use]
    pub const fn space(&self) -> &ChartCoordinateSpace {
        &self.space
    }

    /// Longest away run across all rows.
    #[must_use]
    pub const fn max_away_nights(&self) -> u32 {
        self.max_away
    }

    /// Longest home run across all rows.
    #[must_use]
    pub const fn max_home_nights(&self) -> u32 {
        self.max_home
    }

    /// Offset of the `index`-th away night of an `nights`-night period.
    #[must_use]
    pub fn away_offset(index: u32, nights: u32) -> i64 {
        i64::from(index) - i64::from(nights)
    }

    /// Offset of the `index`-th home night.
    #[must_use]
    pub fn home_offset(index: u32) -> i64 {
        i64::from(index) + 1
    }

    /// Center of the night dot at `(row, offset)`.
    #[must_use]
    pub fn night_center(&self, row: usize, offset: i64) -> Point {
        let cell = self.space.cell_size;
        Point::new(
            self.space.night_anchor.x + cells(offset) * cell,
            self.space.night_anchor.y + count(row) * cell,
        )
    }

    /// One dot per night, row by row, away nights before home nights.
    #[must_use]
    pub fn nights(&self) -> Vec<NightDot> {
        let radius = self.params.night_radius;
        let mut dots = Vec::new();

        for (row_index, row) in self.rows.iter().enumerate() {
            if let Some(away) = row.away {
                for (index, purpose) in (0..).zip(&away.purposes) {
                    dots.push(NightDot {
                        center: self.night_center(row_index, Self::away_offset(index, away.nights)),
                        radius,
                        class: NightClass::from(*purpose),
                    });
                }
            }
            if let Some(home) = row.home {
                for index in 0..home.nights {
                    dots.push(NightDot {
                        center: self.night_center(row_index, Self::home_offset(index)),
                        radius,
                        class: NightClass::Home,
                    });
                }
            }
        }
        dots
    }

    /// Finds the grid position of the night ending on `morning`.
    #[must_use]
    pub fn locate(&self, morning: NaiveDate) -> Option<NightPosition> {
        let (row_index, row) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.contains(morning))?;

        let offset = match (row.away, row.home) {
            (Some(away), _) if morning <= away.end_date => {
                (morning - away.end_date).num_days() - 1
            }
            (_, Some(home)) => (morning - home.start_date).num_days(),
            (_, None) => return None,
        };
        Some(NightPosition {
            row: row_index,
            offset,
        })
    }

    /// Center of the night ending on `morning`.
    #[must_use]
    pub fn date_coords(&self, morning: NaiveDate) -> Option<Point> {
        self.locate(morning)
            .map(|pos| self.night_center(pos.row, pos.offset))
    }

    /// The axis and a gridline every seven nights either side of it.
    #[must_use]
    pub fn gridlines(&self) -> Vec<Gridline> {
        let first_week = -i64::from(self.max_away.div_ceil(7));
        let last_week = i64::from(self.max_home / 7);
        let step = 7.0 * self.space.cell_size;

        (first_week..=last_week)
            .map(|week| Gridline {
                week,
                x: self.space.night_anchor.x + step * cells(week),
                top: self.space.chart.top,
                bottom: self.space.chart.bottom,
                kind: if week == 0 {
                    LineKind::Axis
                } else {
                    LineKind::Gridline
                },
            })
            .collect()
    }

    /// Center of every night ending on 1 January, keyed by the new year.
    #[must_use]
    pub fn year_boundaries(&self) -> BTreeMap<i32, Point> {
        let mut boundaries = BTreeMap::new();

        for (row_index, row) in self.rows.iter().enumerate() {
            for period in [row.away, row.home].into_iter().flatten() {
                if period.start_date.year() >= period.end_date.year() {
                    continue;
                }
                for (index, morning) in (0..).zip(period.mornings()) {
                    if morning.month() != 1 || morning.day() != 1 {
                        continue;
                    }
                    let offset = if period.is_away {
                        Self::away_offset(index, period.nights)
                    } else {
                        Self::home_offset(index)
                    };
                    boundaries.insert(morning.year(), self.night_center(row_index, offset));
                }
            }
        }
        boundaries
    }

    /// Alternating background bands, one per calendar year on the chart.
    ///
    /// A band's top and bottom edges step down by one row at the cell boundary
    /// left of the 1 January night, so every dot sits wholly inside one band.
    #[must_use]
    pub fn year_bands(&self) -> Vec<YearBand> {
        let boundaries: Vec<(i32, Point)> = self.year_boundaries().into_iter().collect();

        let Some(&(first_year, first_start)) = boundaries.first() else {
            return vec![self.year_band(None, None, None, 1)];
        };

        let mut bands = Vec::with_capacity(boundaries.len() + 1);
        bands.push(self.year_band(Some(first_year - 1), None, Some(first_start), 1));
        for (i, &(year, start)) in boundaries.iter().enumerate() {
            let end = boundaries.get(i + 1).map(|&(_, point)| point);
            let fill = if i % 2 == 0 { 0 } else { 1 };
            bands.push(self.year_band(Some(year), Some(start), end, fill));
        }
        bands
    }

    fn year_band(
        &self,
        year: Option<i32>,
        start: Option<Point>,
        end: Option<Point>,
        fill: u8,
    ) -> YearBand {
        let bounds = self.space.chart;
        let half_cell = self.space.cell_size / 2.0;
        let mut points = Vec::with_capacity(8);

        // Top edge, left to right.
        match start {
            None => {
                points.push(Point::new(bounds.left, bounds.top));
                points.push(Point::new(bounds.right, bounds.top));
            }
            Some(start) => {
                let step_x = start.x - half_cell;
                let upper = start.y - half_cell;
                let lower = start.y + half_cell;
                points.push(Point::new(bounds.left, lower));
                points.push(Point::new(step_x, lower));
                points.push(Point::new(step_x, upper));
                points.push(Point::new(bounds.right, upper));
            }
        }

        // Bottom edge, right to left.
        match end {
            None => {
                points.push(Point::new(bounds.right, bounds.bottom));
                points.push(Point::new(bounds.left, bounds.bottom));
            }
            Some(end) => {
                let step_x = end.x - half_cell;
                let upper = end.y - half_cell;
                let lower = end.y + half_cell;
                points.push(Point::new(bounds.right, upper));
                points.push(Point::new(step_x, upper));
                points.push(Point::new(step_x, lower));
                points.push(Point::new(bounds.left, lower));
            }
        }

        let offset = self.params.year_text_offset;
        let label = year.map(|_| Point::new(points[0].x + offset.x, points[0].y + offset.y));

        YearBand {
            year,
            fill,
            points,
            label,
        }
    }

    /// Rounded rectangle spanning a period's first to last night.
    ///
    /// Returns `None` if the period is not drawn on this chart.
    #[must_use]
    pub fn highlight(&self, period: &StayPeriod, style: HighlightStyle) -> Option<Highlight> {
        let first = self.date_coords(period.first_morning())?;
        let last = self.date_coords(period.end_date)?;
        let radius = self.params.highlight_radius;

        Some(Highlight {
            x: first.x - radius,
            y: first.y - radius,
            width: radius * 2.0 + last.x - first.x,
            height: radius * 2.0,
            rx: radius,
            style,
        })
    }

    /// A note anchored below the night ending on `morning`.
    ///
    /// Returns `None` if the night is not drawn on this chart.
    #[must_use]
    pub fn note(
        &self,
        morning: NaiveDate,
        align: NoteAlign,
        text: impl Into<String>,
        subtext: Option<&str>,
        offset: Point,
    ) -> Option<Note> {
        let center = self.date_coords(morning)?;
        let radius = self.params.night_radius;
        let x = match align {
            NoteAlign::Start => center.x - radius + offset.x,
            NoteAlign::End => center.x + radius + offset.x,
        };
        let y = center.y + offset.y;

        Some(Note {
            x,
            text_y: y + self.params.note_text_offset,
            subtext_y: y + self.params.note_subtext_offset,
            align,
            text: text.into(),
            subtext: subtext.map(str::to_uppercase),
        })
    }

    /// The legend note and highlights for the longest away and home periods.
    pub fn annotations(&self) -> Result<Annotations, TimelineError> {
        let periods = || self.rows.iter().flat_map(|r| [r.away, r.home]).flatten();
        let longest_away = stats::longest(periods(), Status::Away)?;
        let longest_home = stats::longest(periods(), Status::Home)?;

        let mut highlights = Vec::with_capacity(2);
        let mut notes = Vec::with_capacity(3);

        if let Some(first_home) = self.rows[0].home {
            notes.extend(self.note(
                first_home.end_date,
                NoteAlign::End,
                "Each dot is one night",
                None,
                Point::new(2.0, -2.0),
            ));
        }

        highlights.extend(self.highlight(longest_away, HighlightStyle::Away));
        notes.extend(self.note(
            longest_away.first_morning(),
            NoteAlign::Start,
            format!("{} nights away", longest_away.nights),
            Some(&longest_away.date_range_label()),
            Point::new(0.0, 0.0),
        ));

        highlights.extend(self.highlight(longest_home, HighlightStyle::Home));
        notes.extend(self.note(
            longest_home.end_date,
            NoteAlign::End,
            format!("{} nights home", longest_home.nights),
            Some(&longest_home.date_range_label()),
            Point::new(0.0, 0.0),
        ));

        Ok(Annotations { highlights, notes })
    }

    /// Title and subtitle baselines.
    #[must_use]
    pub fn title_anchors(&self) -> TitleAnchors {
        let x = self.space.page_center.x;
        let top = self.space.title.top;
        TitleAnchors {
            title: TextAnchor {
                x,
                y: top + self.params.title_text_offset,
            },
            subtitle: TextAnchor {
                x,
                y: top + self.params.title_subtext_offset,
            },
        }
    }

    /// Header box and the labels either side of the axis.
    #[must_use]
    pub fn header(&self) -> HeaderLayout {
        let bounds = self.space.header;
        let offset = self.params.header_text_offset;
        let y = bounds.top + offset.y;
        HeaderLayout {
            bounds,
            away_label: TextAnchor {
                x: self.space.axis_x - offset.x,
                y,
            },
            home_label: TextAnchor {
                x: self.space.axis_x + offset.x,
                y,
            },
        }
    }

    /// Footer baselines.
    #[must_use]
    pub fn footer(&self) -> FooterAnchors {
        let y = self.space.page_height - self.params.footer_padding_bottom;
        FooterAnchors {
            left: TextAnchor {
                x: self.space.chart.left,
                y,
            },
            right: TextAnchor {
                x: self.space.chart.right,
                y,
            },
        }
    }
}
