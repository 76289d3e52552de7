pub mod ffmpeg_frame_source;
pub mod image_file_source;
pub mod image_file_writer;
