//! SDP (Session Description Protocol) generation.
//!
//! Produces the body of a DESCRIBE response. Since this system only
//! ever serves MJPEG over RTP payload type 26, the body is a fixed
//! shape driven entirely by the stream's own frame rate and duration:
//!
//! ```text
//! v=0
//! o=- <sess-id> 1 IN IP4 <addr>
//! s=<session-name>
//! m=video 0 RTP/AVP 26
//! a=rtpmap:26 mjpeg
//! a=framerate:<F>
//! a=range:npt=0-<D>
//! ```

/// Generate the SDP session description for one MJPEG stream.
pub fn generate_sdp(
    ip: &str,
    session_id: &str,
    session_name: &str,
    frame_rate: f64,
    duration: f64,
) -> String {
    let lines = [
        "v=0".to_string(),
        format!("o=- {session_id} 1 IN IP4 {ip}"),
        format!("s={session_name}"),
        "m=video 0 RTP/AVP 26".to_string(),
        "a=rtpmap:26 mjpeg".to_string(),
        format!("a=framerate:{frame_rate}"),
        format!("a=range:npt=0-{duration}"),
    ];

    tracing::debug!(ip, session_id, "generated SDP body");
    format!("{}\n", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_mjpeg_sdp() {
        let sdp = generate_sdp("192.168.1.100", "482913", "mjpeg-rtsp", 20.0, 2.0);
        assert!(sdp.contains("v=0\n"));
        assert!(sdp.contains("o=- 482913 1 IN IP4 192.168.1.100\n"));
        assert!(sdp.contains("s=mjpeg-rtsp\n"));
        assert!(sdp.contains("m=video 0 RTP/AVP 26\n"));
        assert!(sdp.contains("a=rtpmap:26 mjpeg\n"));
        assert!(sdp.contains("a=framerate:20\n"));
        assert!(sdp.contains("a=range:npt=0-2\n"));
        assert!(!sdp.contains('\r'));
    }

    #[test]
    fn rtpmap_precedes_framerate() {
        let sdp = generate_sdp("127.0.0.1", "1", "x", 20.0, 1.0);
        let rtpmap_idx = sdp.find("a=rtpmap").unwrap();
        let framerate_idx = sdp.find("a=framerate").unwrap();
        assert!(rtpmap_idx < framerate_idx);
    }
}
