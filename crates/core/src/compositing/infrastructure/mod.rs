pub mod cpu_frame_compositor;
