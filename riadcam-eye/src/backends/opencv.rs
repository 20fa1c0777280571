//! OpenCV camera capture and HighGUI preview window

use crate::device::{CaptureBackend, CaptureDevice, PreviewBackend, PreviewWindow};
use crate::error::{CameraError, Result};
use crate::frame::Frame;
use opencv::{
    core::{Mat, Scalar, CV_8U, CV_8UC1, CV_8UC3, CV_8UC4},
    highgui,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};
use tracing::{info, warn};

/// Opens `VideoCapture` devices by index.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvCapture;

impl CaptureBackend for OpenCvCapture {
    fn open(&self, index: u32, width: u32, height: u32) -> Result<Box<dyn CaptureDevice>> {
        let mut capture = VideoCapture::new(index as i32, CAP_ANY)
            .map_err(|e| CameraError::Device(format!("Failed to open camera {}: {}", index, e)))?;

        let opened = capture
            .is_opened()
            .map_err(|e| CameraError::Device(format!("Camera {} not opened: {}", index, e)))?;
        if !opened {
            let _ = capture.release();
            return Err(CameraError::Device(format!("Camera {} failed to open", index)));
        }

        // drivers may ignore the request and keep their native mode
        if !capture.set(CAP_PROP_FRAME_WIDTH, width as f64)? {
            warn!("Camera {} rejected width {}", index, width);
        }
        if !capture.set(CAP_PROP_FRAME_HEIGHT, height as f64)? {
            warn!("Camera {} rejected height {}", index, height);
        }

        info!("Camera {} acquired, requested {}x{}", index, width, height);
        Ok(Box::new(OpenCvDevice { index, capture }))
    }
}

struct OpenCvDevice {
    index: u32,
    capture: VideoCapture,
}

impl CaptureDevice for OpenCvDevice {
    fn read(&mut self) -> Result<Frame> {
        let mut mat = Mat::default();
        if !self.capture.read(&mut mat)? || mat.rows() <= 0 || mat.cols() <= 0 {
            return Err(CameraError::Device(format!("Camera {} returned no frame", self.index)));
        }
        mat_to_frame(mat)
    }

    fn release(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Camera {} release failed: {}", self.index, e);
        }
    }
}

fn mat_to_frame(mut mat: Mat) -> Result<Frame> {
    if mat.depth() != CV_8U {
        return Err(CameraError::Device(format!("Unsupported Mat depth: {}", mat.depth())));
    }
    if !mat.is_continuous() {
        mat = mat.try_clone()?;
    }

    let channels = mat.channels();
    if !(1..=4).contains(&channels) {
        return Err(CameraError::Device(format!("Invalid channel count: {}", channels)));
    }

    let data = mat.data_bytes()?.to_vec();
    Ok(Frame::new(mat.cols() as u32, mat.rows() as u32, channels as u32, data))
}

fn frame_to_mat(frame: &Frame) -> Result<Mat> {
    let typ = match frame.channels {
        1 => CV_8UC1,
        3 => CV_8UC3,
        4 => CV_8UC4,
        n => return Err(CameraError::Preview(format!("Cannot display {} channel frame", n))),
    };
    if frame.expected_len() != Some(frame.data.len()) {
        return Err(CameraError::Preview("Frame buffer does not match its dimensions".to_string()));
    }

    let mut mat = Mat::new_rows_cols_with_default(
        frame.height as i32,
        frame.width as i32,
        typ,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(&frame.data);
    Ok(mat)
}

/// HighGUI named windows.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighGuiPreview;

impl PreviewBackend for HighGuiPreview {
    fn create(&self, window_name: &str) -> Result<Box<dyn PreviewWindow>> {
        highgui::named_window(window_name, highgui::WINDOW_AUTOSIZE)?;
        Ok(Box::new(HighGuiWindow {
            name: window_name.to_string(),
        }))
    }
}

struct HighGuiWindow {
    name: String,
}

impl PreviewWindow for HighGuiWindow {
    fn show(&mut self, frame: &Frame) -> Result<()> {
        let mat = frame_to_mat(frame)?;
        highgui::imshow(&self.name, &mat)?;
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<i32>> {
        let key = highgui::wait_key(1)?;
        Ok((key >= 0).then_some(key & 0xFF))
    }

    fn destroy(&mut self) -> Result<()> {
        highgui::destroy_window(&self.name)?;
        Ok(())
    }
}
