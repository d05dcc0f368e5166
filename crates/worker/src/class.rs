/// Resource classes used to schedule producer jobs and tag their logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobClass {
	/// Decode and scale work bound by CPU.
	#[default]
	Cpu,
	/// Fetches from disk or network that mostly wait on I/O.
	Io,
}

impl JobClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Cpu => "cpu",
			Self::Io => "io",
		}
	}
}
