/// YOLO-face locator using ONNX Runtime via `ort`.
///
/// Letterboxes the frame to the model's square input, runs inference,
/// drops low-confidence candidates, applies NMS and maps the survivors
/// back to frame coordinates. Boxes are clamped to the frame and anything
/// smaller than the minimum face side is discarded.
use std::path::Path;

use crate::detection::domain::face_locator::FaceLocator;
use crate::shared::constants::{YOLO_MODEL_NAME, YOLO_MODEL_URL};
use crate::shared::error::FaceError;
use crate::shared::frame::Frame;
use crate::shared::model_resolver;
use crate::shared::region::Region;

use super::execution_provider::locator_execution_providers;
use super::math::{nms, ScoredBox};

/// Fallback input resolution when the model's input shape is dynamic.
const DEFAULT_INPUT_SIZE: u32 = 640;

const NMS_IOU_THRESH: f64 = 0.45;

/// Letterbox padding value, YOLO convention.
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Placement of the scaled frame inside the square model input.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn to_frame(&self, v: f64, pad: u32) -> f64 {
        (v - pad as f64) / self.scale
    }
}

pub struct OnnxFaceLocator {
    session: ort::session::Session,
    confidence: f64,
    min_face_size: u32,
    input_size: u32,
}

impl OnnxFaceLocator {
    /// Loads the model at `model_path`.
    ///
    /// A missing or unloadable model is `DetectorUnavailable`; the locator
    /// never falls back to guessing rectangles.
    pub fn new(model_path: &Path, confidence: f64, min_face_size: u32) -> Result<Self, FaceError> {
        if !model_path.is_file() {
            return Err(FaceError::DetectorUnavailable(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        let session = load_session(model_path).map_err(|e| {
            FaceError::DetectorUnavailable(format!("cannot load {}: {e}", model_path.display()))
        })?;

        // NCHW: [1, 3, H, W]
        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Face locator loaded {} (input {input_size}px, confidence {confidence}, min face {min_face_size}px)",
            model_path.display()
        );

        Ok(Self {
            session,
            confidence,
            min_face_size,
            input_size,
        })
    }

    /// Resolves the bundled YOLO-face model, downloading it on first use.
    pub fn from_default_model(confidence: f64, min_face_size: u32) -> Result<Self, FaceError> {
        let path = model_resolver::resolve(YOLO_MODEL_NAME, YOLO_MODEL_URL, None)?;
        Self::new(&path, confidence, min_face_size)
    }
}

fn load_session(model_path: &Path) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    let session = ort::session::Session::builder()?
        .with_execution_providers(locator_execution_providers())?
        .commit_from_file(model_path)?;
    Ok(session)
}

fn detection_err(e: impl std::fmt::Display) -> FaceError {
    FaceError::Detection(e.to_string())
}

impl FaceLocator for OnnxFaceLocator {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<Region>, FaceError> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        let (input, placement) = letterbox(frame, self.input_size);
        let input_value = ort::value::Tensor::from_array(input).map_err(detection_err)?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(detection_err)?;
        if outputs.len() == 0 {
            return Err(FaceError::Detection("model produced no outputs".into()));
        }
        let tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(detection_err)?;
        let data = tensor
            .as_slice()
            .ok_or_else(|| FaceError::Detection("output tensor is not contiguous".into()))?;

        let candidates = decode_output(data, tensor.shape(), self.confidence, &placement)?;
        let kept = nms(candidates, NMS_IOU_THRESH);

        let regions: Vec<Region> = kept
            .iter()
            .filter_map(|b| {
                Region::from_corners(b.bbox[0], b.bbox[1], b.bbox[2], b.bbox[3])
                    .clamp_to(frame.width(), frame.height())
            })
            .filter(|r| {
                r.width >= self.min_face_size as i32 && r.height >= self.min_face_size as i32
            })
            .collect();

        log::debug!(
            "Frame {}: {} candidates, {} faces",
            frame.index(),
            kept.len(),
            regions.len()
        );
        Ok(regions)
    }
}

/// Letterbox-resize a frame into a `target` × `target` NCHW float tensor.
///
/// Gray frames are replicated across the three input channels.
fn letterbox(frame: &Frame, target: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;

    let scale = (target as f64 / fw).min(target as f64 / fh);
    let new_w = ((fw * scale).round() as u32).min(target);
    let new_h = ((fh * scale).round() as u32).min(target);
    let pad_x = (target - new_w) / 2;
    let pad_y = (target - new_h) / 2;

    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target as usize, target as usize), PAD_VALUE);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let last_channel = (frame.channels() as usize).saturating_sub(1);

    // nearest neighbor
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c.min(last_channel)]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

/// Parses raw YOLO output into frame-space candidate boxes.
///
/// Accepts `[1, features, detections]` (transposed) and
/// `[1, detections, features]`. Each row starts `[cx, cy, w, h, conf]`;
/// trailing keypoint values are ignored.
fn decode_output(
    data: &[f32],
    shape: &[usize],
    min_confidence: f64,
    placement: &Letterbox,
) -> Result<Vec<ScoredBox>, FaceError> {
    if shape.len() != 3 {
        return Err(FaceError::Detection(format!(
            "unexpected output shape {shape:?}"
        )));
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 || data.len() < num_dets * num_feats {
        return Err(FaceError::Detection(format!(
            "output shape {shape:?} does not hold box rows"
        )));
    }
    let value = |det: usize, feat: usize| {
        let idx = if transposed {
            feat * num_dets + det
        } else {
            det * num_feats + feat
        };
        data[idx] as f64
    };

    let mut boxes = Vec::new();
    for i in 0..num_dets {
        let conf = value(i, 4);
        if conf < min_confidence {
            continue;
        }
        let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
        boxes.push(ScoredBox {
            bbox: [
                placement.to_frame(cx - w / 2.0, placement.pad_x),
                placement.to_frame(cy - h / 2.0, placement.pad_y),
                placement.to_frame(cx + w / 2.0, placement.pad_x),
                placement.to_frame(cy + h / 2.0, placement.pad_y),
            ],
            confidence: conf,
        });
    }
    Ok(boxes)
}
