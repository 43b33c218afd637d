use super::status::EmbeddingStatus;

#[derive(Clone, Debug, PartialEq)]
pub enum HelperEvent {
    StatusChanged(EmbeddingStatus),
    ClicksChanged(usize),
    Repainted,
}

pub type Listener = Box<dyn Fn(&HelperEvent) + Send + Sync>;

#[derive(Default)]
pub(super) struct Listeners(Vec<Listener>);

impl Listeners {
    pub(super) fn push(&mut self, listener: Listener) {
        self.0.push(listener);
    }

    pub(super) fn emit(&self, event: HelperEvent) {
        self.0.iter().for_each(|listener| listener(&event));
    }
}
