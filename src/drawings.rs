//! Drawing part parsing - locating chart frames.
//!
//! Drawings are stored in `xl/drawings/drawing*.xml` and referenced from a
//! sheet through `xl/worksheets/_rels/sheet*.xml.rels`. Charts appear as
//! graphic frames inside anchor elements:
//! - `twoCellAnchor`: anchored to two cells (resizes with cells)
//! - `oneCellAnchor`: anchored to one cell with absolute size
//! - `absoluteAnchor`: absolute position (chart sheets use this)
//!
//! A frame's `graphicData` holds either `c:chart r:id=".."` (2006 chart) or
//! `cx:chart r:id=".."` (chartex). Chartex frames are usually wrapped in
//! `mc:AlternateContent` with a picture or shape fallback:
//!
//! ```text
//! <mc:AlternateContent>
//!   <mc:Choice Requires="cx1"> <xdr:graphicFrame> .. <cx:chart r:id="rId1"/> </mc:Choice>
//!   <mc:Fallback> <xdr:sp> .. </mc:Fallback>
//! </mc:AlternateContent>
//! ```
//!
//! The first branch that yields a chart wins; later branches are skipped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::namespaces::{element_matches, get_rel_id};
use crate::types::ChartAnchor;

/// A chart frame found in a drawing, before its relationship is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawingChart {
    /// Relationship id in the drawing's `.rels`
    pub rel_id: String,
    /// None for absolute anchors and frames outside any anchor
    pub anchor: Option<ChartAnchor>,
    /// `cNvPr/@name` of the enclosing graphic frame
    pub name: Option<String>,
}

/// Scan a drawing part for chart frames, in anchor order.
///
/// A malformed document yields the frames read before the error.
pub fn parse_chart_anchors(xml: &[u8]) -> Vec<DrawingChart> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut charts = Vec::new();
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();

    // Parsing state
    let mut current_anchor: Option<AnchorBuilder> = None;
    let mut in_from = false;
    let mut in_to = false;
    let mut in_graphic_frame = false;
    let mut frame_name: Option<String> = None;
    let mut current_element: Option<PositionField> = None;
    // One entry per open mc:AlternateContent: has a branch produced a chart?
    let mut alternate_content: Vec<bool> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local_name = e.local_name();
                match local_name.as_ref() {
                    b"AlternateContent" => alternate_content.push(false),
                    b"Choice" | b"Fallback" if alternate_content.last() == Some(&true) => {
                        skip_buf.clear();
                        if let Err(err) = reader.read_to_end_into(e.name(), &mut skip_buf) {
                            tracing::warn!("malformed drawing: {err}");
                            break;
                        }
                    }
                    b"twoCellAnchor" | b"oneCellAnchor" => {
                        current_anchor = Some(AnchorBuilder::cell_anchored());
                    }
                    b"absoluteAnchor" => current_anchor = Some(AnchorBuilder::default()),
                    b"from" => in_from = true,
                    b"to" => in_to = true,
                    b"graphicFrame" => {
                        in_graphic_frame = true;
                        frame_name = None;
                    }
                    b"col" => current_element = Some(PositionField::Col),
                    b"row" => current_element = Some(PositionField::Row),
                    _ => {
                        if record_frame_element(
                            e,
                            in_graphic_frame,
                            &mut frame_name,
                            current_anchor.as_mut(),
                            &mut charts,
                        ) {
                            mark_branch_resolved(&mut alternate_content);
                        }
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                if record_frame_element(
                    e,
                    in_graphic_frame,
                    &mut frame_name,
                    current_anchor.as_mut(),
                    &mut charts,
                ) {
                    mark_branch_resolved(&mut alternate_content);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(field), Some(anchor)) = (current_element, current_anchor.as_mut()) {
                    if let Ok(text) = e.unescape() {
                        let value = text.trim().parse::<u32>().ok();
                        match field {
                            PositionField::Col if in_from => anchor.from_col = value,
                            PositionField::Row if in_from => anchor.from_row = value,
                            PositionField::Col if in_to => anchor.to_col = value,
                            PositionField::Row if in_to => anchor.to_row = value,
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"AlternateContent" => {
                    alternate_content.pop();
                }
                b"twoCellAnchor" | b"oneCellAnchor" | b"absoluteAnchor" => {
                    if let Some(builder) = current_anchor.take() {
                        charts.extend(builder.build());
                    }
                }
                b"from" => in_from = false,
                b"to" => in_to = false,
                b"graphicFrame" => in_graphic_frame = false,
                b"col" | b"row" => current_element = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("malformed drawing: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    // A truncated document can leave an anchor open.
    if let Some(builder) = current_anchor.take() {
        charts.extend(builder.build());
    }

    charts
}

/// Handle `cNvPr` and `chart` elements. Returns true when a chart was
/// recorded.
fn record_frame_element(
    e: &BytesStart,
    in_graphic_frame: bool,
    frame_name: &mut Option<String>,
    anchor: Option<&mut AnchorBuilder>,
    charts: &mut Vec<DrawingChart>,
) -> bool {
    if in_graphic_frame && element_matches(e, b"cNvPr") {
        *frame_name = crate::xml_helpers::attr_string(e, b"name");
        return false;
    }
    if !element_matches(e, b"chart") {
        return false;
    }
    let Some(rel_id) = get_rel_id(e) else {
        return false;
    };

    match anchor {
        Some(anchor) => anchor.charts.push((rel_id, frame_name.clone())),
        None => charts.push(DrawingChart {
            rel_id,
            anchor: None,
            name: frame_name.clone(),
        }),
    }
    true
}

fn mark_branch_resolved(alternate_content: &mut [bool]) {
    if let Some(resolved) = alternate_content.last_mut() {
        *resolved = true;
    }
}

#[derive(Debug, Clone, Copy)]
enum PositionField {
    Col,
    Row,
}

/// Builder for one anchor during parsing
#[derive(Debug, Default)]
struct AnchorBuilder {
    cell_anchored: bool,
    from_col: Option<u32>,
    from_row: Option<u32>,
    to_col: Option<u32>,
    to_row: Option<u32>,
    /// (rel id, frame name); group shapes can hold several frames
    charts: Vec<(String, Option<String>)>,
}

impl AnchorBuilder {
    fn cell_anchored() -> Self {
        Self {
            cell_anchored: true,
            ..Self::default()
        }
    }

    fn build(self) -> impl Iterator<Item = DrawingChart> {
        let anchor = self.cell_anchored.then(|| ChartAnchor {
            from_col: self.from_col.unwrap_or(0),
            from_row: self.from_row.unwrap_or(0),
            to_col: self.to_col,
            to_row: self.to_row,
        });
        self.charts
            .into_iter()
            .map(move |(rel_id, name)| DrawingChart {
                rel_id,
                anchor,
                name,
            })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    const CLASSIC: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing"
          xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
          xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <xdr:twoCellAnchor editAs="oneCell">
    <xdr:from><xdr:col>4</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>1</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
    <xdr:to><xdr:col>11</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>16</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
    <xdr:graphicFrame macro="">
      <xdr:nvGraphicFramePr><xdr:cNvPr id="2" name="Chart 1"/><xdr:cNvGraphicFramePr/></xdr:nvGraphicFramePr>
      <a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart">
        <c:chart r:id="rId1"/>
      </a:graphicData></a:graphic>
    </xdr:graphicFrame>
    <xdr:clientData/>
  </xdr:twoCellAnchor>
  <xdr:oneCellAnchor>
    <xdr:from><xdr:col>0</xdr:col><xdr:row>20</xdr:row></xdr:from>
    <xdr:ext cx="100" cy="100"/>
    <xdr:pic><xdr:nvPicPr><xdr:cNvPr id="3" name="Picture 1"/></xdr:nvPicPr></xdr:pic>
    <xdr:clientData/>
  </xdr:oneCellAnchor>
  <xdr:oneCellAnchor>
    <xdr:from><xdr:col>2</xdr:col><xdr:row>30</xdr:row></xdr:from>
    <xdr:graphicFrame>
      <xdr:nvGraphicFramePr><xdr:cNvPr id="4" name="Chart 2"/></xdr:nvGraphicFramePr>
      <a:graphic><a:graphicData><c:chart r:id="rId2"/></a:graphicData></a:graphic>
    </xdr:graphicFrame>
  </xdr:oneCellAnchor>
</xdr:wsDr>"#;

    const CHARTEX: &str = r#"<xdr:wsDr xmlns:xdr="x" xmlns:mc="m" xmlns:cx="c" xmlns:r="r" xmlns:a="a">
  <xdr:twoCellAnchor>
    <xdr:from><xdr:col>1</xdr:col><xdr:row>2</xdr:row></xdr:from>
    <xdr:to><xdr:col>5</xdr:col><xdr:row>9</xdr:row></xdr:to>
    <mc:AlternateContent>
      <mc:Choice Requires="cx1">
        <xdr:graphicFrame>
          <xdr:nvGraphicFramePr><xdr:cNvPr id="2" name="Histogram"/></xdr:nvGraphicFramePr>
          <a:graphic><a:graphicData><cx:chart r:id="rId7"/></a:graphicData></a:graphic>
        </xdr:graphicFrame>
      </mc:Choice>
      <mc:Fallback>
        <xdr:graphicFrame>
          <xdr:nvGraphicFramePr><xdr:cNvPr id="2" name="Histogram copy"/></xdr:nvGraphicFramePr>
          <a:graphic><a:graphicData><cx:chart r:id="rId8"/></a:graphicData></a:graphic>
        </xdr:graphicFrame>
      </mc:Fallback>
    </mc:AlternateContent>
    <xdr:clientData/>
  </xdr:twoCellAnchor>
</xdr:wsDr>"#;

    #[test]
    fn test_classic_chart_anchors() {
        let charts = parse_chart_anchors(CLASSIC.as_bytes());
        assert_eq!(charts.len(), 2);

        assert_eq!(charts[0].rel_id, "rId1");
        assert_eq!(charts[0].name.as_deref(), Some("Chart 1"));
        assert_eq!(
            charts[0].anchor,
            Some(ChartAnchor {
                from_col: 4,
                from_row: 1,
                to_col: Some(11),
                to_row: Some(16),
            })
        );

        assert_eq!(charts[1].rel_id, "rId2");
        let anchor = charts[1].anchor.unwrap();
        assert_eq!((anchor.from_col, anchor.from_row), (2, 30));
        assert_eq!(anchor.to_col, None);
    }

    #[test]
    fn test_alternate_content_first_choice_wins() {
        let charts = parse_chart_anchors(CHARTEX.as_bytes());
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].rel_id, "rId7");
        assert_eq!(charts[0].name.as_deref(), Some("Histogram"));
        assert_eq!(charts[0].anchor.unwrap().to_row, Some(9));
    }

    #[test]
    fn test_fallback_used_when_choice_has_no_chart() {
        let xml = r#"<wsDr><twoCellAnchor><from><col>0</col><row>0</row></from>
  <AlternateContent>
    <Choice><sp><nvSpPr><cNvPr id="1" name="Shape"/></nvSpPr></sp></Choice>
    <Fallback><graphicFrame><chart id="rId3"/></graphicFrame></Fallback>
  </AlternateContent>
</twoCellAnchor></wsDr>"#;
        let charts = parse_chart_anchors(xml.as_bytes());
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].rel_id, "rId3");
    }

    #[test]
    fn test_absolute_anchor_has_no_cell_position() {
        let xml = r#"<wsDr><absoluteAnchor><pos x="0" y="0"/><ext cx="1" cy="1"/>
  <graphicFrame><graphic><graphicData><chart r:id="rId1"/></graphicData></graphic></graphicFrame>
</absoluteAnchor></wsDr>"#;
        let charts = parse_chart_anchors(xml.as_bytes());
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].anchor, None);
    }

    #[test]
    fn test_drawing_without_charts() {
        let xml = r#"<wsDr><oneCellAnchor><from><col>0</col><row>0</row></from>
  <pic><blipFill><blip r:embed="rId1"/></blipFill></pic></oneCellAnchor></wsDr>"#;
        assert!(parse_chart_anchors(xml.as_bytes()).is_empty());
    }
}
