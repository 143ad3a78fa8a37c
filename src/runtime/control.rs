/// Everything the user can ask for, after key/mouse decoding.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    CursorDown,
    CursorUp,
    /// Select the track under the cursor and start it.
    PlayCursor,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Grab (if needed) and move the preview to a fraction.
    SeekPreview(f64),
    /// Grab (if needed) and move the preview by a signed fraction.
    SeekNudge(f64),
    /// Release the seek control at the previewed fraction.
    SeekCommit,
    SeekCancel,
    /// Grab and release in one go.
    SeekTo(f64),
    Rescan,
    OpenUrlInput,
    UrlChar(char),
    UrlBackspace,
    UrlPaste(String),
    UrlSubmit,
    UrlCancel,
    DismissNotice,
}

impl ControlCmd {
    /// Commands that drive the transport and need a selected track.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ControlCmd::PlayPause
                | ControlCmd::Stop
                | ControlCmd::Next
                | ControlCmd::Prev
                | ControlCmd::SeekPreview(_)
                | ControlCmd::SeekNudge(_)
                | ControlCmd::SeekTo(_)
        )
    }
}
