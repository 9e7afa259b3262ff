//! Label types produced by models and stored on samples.
//!
//! This module provides the label entities the pipeline materializes:
//! classifications, detections with normalized bounding boxes, polylines
//! convertible to detections, and composite labels keyed by name. It also
//! implements confidence filtering, which removes low-confidence sub-parts
//! of a label before it is written to a sample field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single classification with an optional confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// The class label.
    pub label: String,
    /// The prediction confidence, in [0, 1], if available.
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl Classification {
    /// Creates a new classification.
    pub fn new(label: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// An object detection with a normalized bounding box.
///
/// The bounding box is `[x, y, w, h]` relative to the image size, with
/// coordinates in `[0, 1] x [0, 1]` and the origin at the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// The class label, if any.
    #[serde(default)]
    pub label: Option<String>,
    /// The normalized `[x, y, w, h]` bounding box.
    pub bounding_box: [f64; 4],
    /// The prediction confidence, in [0, 1], if available.
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl Detection {
    /// Creates a new detection from a normalized bounding box.
    pub fn new(bounding_box: [f64; 4]) -> Self {
        Self {
            label: None,
            bounding_box,
            confidence: None,
        }
    }

    /// Set the class label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// An ordered sequence of detections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detections {
    /// The detections, in their original order.
    pub detections: Vec<Detection>,
}

impl Detections {
    /// Creates a new detections container.
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// Returns the number of detections.
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    /// Checks whether the container holds no detections.
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// A polyline defined by normalized points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    /// The class label, if any.
    #[serde(default)]
    pub label: Option<String>,
    /// The normalized `[x, y]` vertices of the polyline.
    pub points: Vec<[f64; 2]>,
    /// The prediction confidence, in [0, 1], if available.
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl Polyline {
    /// Creates a new polyline from normalized points.
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self {
            label: None,
            points,
            confidence: None,
        }
    }

    /// Converts this polyline into a detection whose bounding box is the
    /// axis-aligned bounding box of the polyline's points, clamped to the
    /// unit square.
    ///
    /// # Returns
    ///
    /// A detection carrying over the label and confidence. A polyline with
    /// no points yields a zero-area box at the origin.
    pub fn to_detection(&self) -> Detection {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for &[x, y] in &self.points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let bounding_box = if self.points.is_empty() {
            [0.0, 0.0, 0.0, 0.0]
        } else {
            let x = min_x.clamp(0.0, 1.0);
            let y = min_y.clamp(0.0, 1.0);
            let w = (max_x.clamp(0.0, 1.0) - x).max(0.0);
            let h = (max_y.clamp(0.0, 1.0) - y).max(0.0);
            [x, y, w, h]
        };

        Detection {
            label: self.label.clone(),
            bounding_box,
            confidence: self.confidence,
        }
    }
}

/// An ordered sequence of polylines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polylines {
    /// The polylines, in their original order.
    pub polylines: Vec<Polyline>,
}

impl Polylines {
    /// Creates a new polylines container.
    pub fn new(polylines: Vec<Polyline>) -> Self {
        Self { polylines }
    }

    /// Converts every polyline into a detection, preserving order.
    pub fn to_detections(&self) -> Detections {
        Detections::new(self.polylines.iter().map(Polyline::to_detection).collect())
    }
}

/// A label produced by a model.
///
/// Composite labels map names to sub-labels; the router materializes them
/// under prefixed field names (`"{label_field}_{name}"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Label {
    /// A single classification.
    Classification(Classification),
    /// A single object detection.
    Detection(Detection),
    /// A set of object detections.
    Detections(Detections),
    /// A single polyline.
    Polyline(Polyline),
    /// A set of polylines.
    Polylines(Polylines),
    /// A named collection of sub-labels.
    Composite(BTreeMap<String, Label>),
}

impl Label {
    /// Removes sub-parts of this label whose confidence falls below the
    /// given threshold.
    ///
    /// Labels without a confidence value are retained. Detections and
    /// polylines are filtered element-wise (an emptied container is still a
    /// valid label); a classification below the threshold is dropped
    /// entirely; composites are filtered recursively and dropped when no
    /// entry survives.
    ///
    /// # Arguments
    ///
    /// * `threshold` - The minimum confidence for a sub-part to survive.
    ///
    /// # Returns
    ///
    /// The filtered label, or None if nothing survived.
    pub fn filter_confidence(self, threshold: f64) -> Option<Label> {
        match self {
            Label::Classification(c) => match c.confidence {
                Some(conf) if conf < threshold => None,
                _ => Some(Label::Classification(c)),
            },
            Label::Detection(d) => match d.confidence {
                Some(conf) if conf < threshold => None,
                _ => Some(Label::Detection(d)),
            },
            Label::Polyline(p) => match p.confidence {
                Some(conf) if conf < threshold => None,
                _ => Some(Label::Polyline(p)),
            },
            Label::Detections(mut d) => {
                d.detections
                    .retain(|det| det.confidence.is_none_or(|conf| conf >= threshold));
                Some(Label::Detections(d))
            }
            Label::Polylines(mut p) => {
                p.polylines
                    .retain(|poly| poly.confidence.is_none_or(|conf| conf >= threshold));
                Some(Label::Polylines(p))
            }
            Label::Composite(map) => {
                let filtered: BTreeMap<String, Label> = map
                    .into_iter()
                    .filter_map(|(name, label)| {
                        label.filter_confidence(threshold).map(|l| (name, l))
                    })
                    .collect();
                if filtered.is_empty() {
                    None
                } else {
                    Some(Label::Composite(filtered))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyline_to_detection_bounding_box() {
        let polyline = Polyline::new(vec![[0.2, 0.1], [0.6, 0.3], [0.4, 0.5]]);
        let detection = polyline.to_detection();
        let [x, y, w, h] = detection.bounding_box;
        assert!((x - 0.2).abs() < 1e-12);
        assert!((y - 0.1).abs() < 1e-12);
        assert!((w - 0.4).abs() < 1e-12);
        assert!((h - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_polyline_to_detection_clamps_to_unit_square() {
        let polyline = Polyline::new(vec![[-0.1, 0.5], [1.2, 0.9]]);
        let detection = polyline.to_detection();
        let [x, y, w, h] = detection.bounding_box;
        assert_eq!(x, 0.0);
        assert_eq!(y, 0.5);
        assert!((w - 1.0).abs() < 1e-12);
        assert!((h - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_polylines_to_detections_preserves_order() {
        let polylines = Polylines::new(vec![
            Polyline::new(vec![[0.0, 0.0], [0.1, 0.1]]),
            Polyline::new(vec![[0.5, 0.5], [0.9, 0.9]]),
        ]);
        let detections = polylines.to_detections();
        assert_eq!(detections.len(), 2);
        assert!(detections.detections[0].bounding_box[0] < 0.5);
        assert_eq!(detections.detections[1].bounding_box[0], 0.5);
    }

    #[test]
    fn test_filter_confidence_detections() {
        let label = Label::Detections(Detections::new(vec![
            Detection::new([0.0, 0.0, 0.1, 0.1]).with_confidence(0.9),
            Detection::new([0.1, 0.1, 0.1, 0.1]).with_confidence(0.2),
            Detection::new([0.2, 0.2, 0.1, 0.1]),
        ]));

        let filtered = label.filter_confidence(0.5).unwrap();
        match filtered {
            Label::Detections(d) => {
                // Low-confidence detection removed, unscored detection kept.
                assert_eq!(d.len(), 2);
            }
            other => panic!("expected detections, got {other:?}"),
        }
    }

    #[test]
    fn test_filter_confidence_drops_low_classification() {
        let label = Label::Classification(Classification::new("cat", Some(0.3)));
        assert!(label.filter_confidence(0.5).is_none());

        let label = Label::Classification(Classification::new("cat", Some(0.8)));
        assert!(label.filter_confidence(0.5).is_some());
    }

    #[test]
    fn test_filter_confidence_composite_recurses() {
        let mut map = BTreeMap::new();
        map.insert(
            "weak".to_string(),
            Label::Classification(Classification::new("a", Some(0.1))),
        );
        map.insert(
            "strong".to_string(),
            Label::Classification(Classification::new("b", Some(0.9))),
        );

        let filtered = Label::Composite(map).filter_confidence(0.5).unwrap();
        match filtered {
            Label::Composite(map) => {
                assert_eq!(map.len(), 1);
                assert!(map.contains_key("strong"));
            }
            other => panic!("expected composite, got {other:?}"),
        }
    }
}
