pub mod landmarks {
    pub mod domain {
        pub mod face_landmarks;
        pub mod face_reference_frame;
        pub mod landmark_source;
    }
    pub mod infrastructure;
}

pub mod placement {
    pub mod domain {
        pub mod canvas_geometry;
        pub mod mask_placement_planner;
        pub mod mask_size;
        pub mod mask_transform;
        pub mod transform_smoother;
    }
}

pub mod filters {
    pub mod domain {
        pub mod filter;
        pub mod mask_image;
        pub mod mask_loader;
    }
    pub mod infrastructure;
}

pub mod compositing {
    pub mod domain {
        pub mod frame_compositor;
        pub mod overlay_fade;
    }
    pub mod infrastructure;
}

pub mod capture {
    pub mod domain {
        pub mod capture_exporter;
        pub mod captured_image;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod video_reader;
        pub mod video_source;
        pub mod video_writer;
    }
    pub mod infrastructure {
        pub mod ffmpeg_reader;
        pub mod ffmpeg_writer;
        pub mod image_file_reader;
    }
}

pub mod pipeline {
    pub mod capture_still_use_case;
    pub mod pipeline_logger;
    pub mod render_session;
    pub mod render_video_use_case;
}

pub mod shared {
    pub mod asset_resolver;
    pub mod constants;
    pub mod frame;
    pub mod settings;
    pub mod video_metadata;
}
