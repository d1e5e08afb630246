//! Dispatch of stream items by document kind.

use crate::document::{Document, DocumentKind};

/// A consumer of a run's document stream.
///
/// Every per-kind hook defaults to accepting and dropping the document, so an
/// implementor only overrides the kinds it cares about. Feed the stream
/// through [`DocumentRouter::route`].
pub trait DocumentRouter {
    type Error;

    /// Hand one document to the hook for its kind.
    fn route(&mut self, kind: DocumentKind, doc: Document) -> Result<(), Self::Error> {
        match kind {
            DocumentKind::Start => self.start(doc),
            DocumentKind::Stop => self.stop(doc),
            DocumentKind::Descriptor => self.descriptor(doc),
            DocumentKind::Event => self.event(doc),
            DocumentKind::EventPage => self.event_page(doc),
            DocumentKind::Resource => self.resource(doc),
            DocumentKind::Datum => self.datum(doc),
            DocumentKind::DatumPage => self.datum_page(doc),
        }
    }

    fn start(&mut self, _doc: Document) -> Result<(), Self::Error> {
        Ok(())
    }

    fn stop(&mut self, _doc: Document) -> Result<(), Self::Error> {
        Ok(())
    }

    fn descriptor(&mut self, _doc: Document) -> Result<(), Self::Error> {
        Ok(())
    }

    fn event(&mut self, _doc: Document) -> Result<(), Self::Error> {
        Ok(())
    }

    fn event_page(&mut self, _doc: Document) -> Result<(), Self::Error> {
        Ok(())
    }

    fn resource(&mut self, _doc: Document) -> Result<(), Self::Error> {
        Ok(())
    }

    fn datum(&mut self, _doc: Document) -> Result<(), Self::Error> {
        Ok(())
    }

    fn datum_page(&mut self, _doc: Document) -> Result<(), Self::Error> {
        Ok(())
    }
}
